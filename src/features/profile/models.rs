use std::fmt;

use base64::{Engine as _, engine::general_purpose};
use serde::Deserialize;
use serde_json::error::Category;

use crate::error::AppError;

/// 玩家标识：用户名或 UUID。
///
/// 本地只校验非空，合法性以上游服务为准。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerIdentifier {
    Username(String),
    UniqueId(String),
}

impl PlayerIdentifier {
    pub fn username(raw: &str) -> Result<Self, AppError> {
        Ok(Self::Username(non_empty(raw, "用户名")?))
    }

    pub fn unique_id(raw: &str) -> Result<Self, AppError> {
        Ok(Self::UniqueId(non_empty(raw, "UUID")?))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Username(v) | Self::UniqueId(v) => v,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Username(_) => "username",
            Self::UniqueId(_) => "uuid",
        }
    }
}

impl fmt::Display for PlayerIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.as_str())
    }
}

fn non_empty(raw: &str, label: &str) -> Result<String, AppError> {
    let v = raw.trim();
    if v.is_empty() {
        return Err(AppError::Validation(format!("{label}不能为空")));
    }
    Ok(v.to_string())
}

/// 用户名查询接口响应：`{"id": "...", "name": "..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct UsernameLookupResponse {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// 会话服务器档案响应
#[derive(Debug, Clone, Deserialize)]
pub struct SessionProfileResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Vec<ProfileProperty>,
}

/// 档案属性，贴图信息位于 `name == "textures"` 的条目
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileProperty {
    #[serde(default)]
    pub name: Option<String>,
    /// base64 编码的 JSON
    pub value: String,
    #[serde(default)]
    pub signature: Option<String>,
}

impl SessionProfileResponse {
    /// 优先取名为 `textures` 的属性；都没有名字时退回第一个。
    pub fn texture_property(&self) -> Option<&ProfileProperty> {
        self.properties
            .iter()
            .find(|p| p.name.as_deref() == Some("textures"))
            .or_else(|| self.properties.first())
    }
}

/// 解码后的贴图描述
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureDescriptor {
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub profile_name: Option<String>,
    pub textures: Textures,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Textures {
    #[serde(rename = "SKIN")]
    pub skin: SkinTexture,
    #[serde(rename = "CAPE", default)]
    pub cape: Option<CapeTexture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkinTexture {
    pub url: String,
    #[serde(default)]
    pub metadata: Option<SkinMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkinMetadata {
    /// `slim` 表示细手臂模型，缺省为经典模型
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CapeTexture {
    pub url: String,
}

impl TextureDescriptor {
    /// 从档案属性的 base64 值解出贴图描述。
    ///
    /// base64 或 JSON 语法错误归为 `Decode`；JSON 合法但缺字段归为 `MalformedResponse`。
    pub fn from_property_value(value: &str) -> Result<Self, AppError> {
        let raw = general_purpose::STANDARD
            .decode(value.trim())
            .map_err(|e| AppError::Decode(format!("贴图属性 base64 解码失败: {e}")))?;

        serde_json::from_slice(&raw).map_err(|e| match e.classify() {
            Category::Data => AppError::MalformedResponse(format!("贴图描述缺少必要字段: {e}")),
            Category::Syntax | Category::Eof | Category::Io => {
                AppError::Decode(format!("贴图描述 JSON 解析失败: {e}"))
            }
        })
    }

    pub fn skin_url(&self) -> &str {
        &self.textures.skin.url
    }

    pub fn is_slim(&self) -> bool {
        self.textures
            .skin
            .metadata
            .as_ref()
            .and_then(|m| m.model.as_deref())
            == Some("slim")
    }
}
