use crate::{
    Client, Error, ResourceKind,
    api::{Follow, Page, paginate},
    lcm::{LcmEntity, LcmEntityFilter},
};

/// Lists the life-cycle management entities (data product, segment, client)
/// of the projects an account can see.
#[derive(Debug, Clone)]
pub struct LcmService {
    client: Client,
}

impl LcmService {
    /// A service using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The entities matching `filter`, fetched lazily page by page, up to
    /// `limit` entities.
    pub fn list_lcm_entities(
        &self,
        account_id: &str,
        filter: &LcmEntityFilter,
        limit: Option<usize>,
    ) -> impl Iterator<Item = Result<LcmEntity, Error>> + use<> {
        let client = self.client.clone();
        let account_id = account_id.to_owned();

        paginate(filter.first_page_uri(&account_id), limit, move |uri: &str| {
            client
                .send(Follow::<Page<LcmEntity>>::new(uri))
                .map_err(|e| e.or_not_found(ResourceKind::Account, account_id.as_str()))
        })
    }
}
