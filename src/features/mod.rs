/// 头像合成（Icon Compositor）
pub mod face;
/// 健康检查
pub mod health;
/// 身份解析（Identity Resolver）
pub mod profile;
