//! API operations concerning life-cycle management entities: the
//! data product, segment and client a project belongs to.

use serde::{Deserialize, Serialize};

use crate::api::{PageItem, UriTemplate, with_query, wrapped};

/// The LCM entities visible to an account, paged.
pub const LCM_ENTITIES: UriTemplate = UriTemplate::new("/gdc/account/profile/{id}/lcmEntities");

/// One project and its place in LCM, `{"lcmEntity": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LcmEntity {
    /// The project id.
    pub project_id: String,
    /// The client id, for client projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// The segment id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    /// The data product id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_product_id: Option<String>,
    /// Links to the project and the LCM objects.
    #[serde(default)]
    pub links: LcmEntityLinks,
}

/// Links of an [LcmEntity].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LcmEntityLinks {
    /// The project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// The client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// The segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    /// The data product.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_product: Option<String>,
}

wrapped!(LcmEntity => "lcmEntity");

impl PageItem for LcmEntity {
    const PAGE_ROOT: &'static str = "lcmEntities";
}

/// Narrows a listing of LCM entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LcmEntityFilter {
    /// Only entities of this data product.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_product: Option<String>,
    /// Only entities of this segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    /// Only entities of this client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

impl LcmEntityFilter {
    /// No filtering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only entities of `data_product`.
    pub fn data_product(self, data_product: impl Into<String>) -> Self {
        Self {
            data_product: Some(data_product.into()),
            ..self
        }
    }

    /// Only entities of `segment`.
    pub fn segment(self, segment: impl Into<String>) -> Self {
        Self {
            segment: Some(segment.into()),
            ..self
        }
    }

    /// Only entities of `client`.
    pub fn client(self, client: impl Into<String>) -> Self {
        Self {
            client: Some(client.into()),
            ..self
        }
    }

    /// The URI of the first page for `account_id`.
    pub fn first_page_uri(&self, account_id: &str) -> String {
        with_query(LCM_ENTITIES.expand(&[account_id]), self)
    }
}
