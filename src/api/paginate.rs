use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::{DataResponse, Envelope, Wrapped};

/// Implemented by item types that are listed in pages, naming the root key
/// of the page, e.g. `{"projects": {"items": [{"project": ...}], ...}}`.
pub trait PageItem: Wrapped {
    /// The root key of a page of these items.
    const PAGE_ROOT: &'static str;
}

/// The paging block of a [Page].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    /// The offset of the first item in the page.
    #[serde(default)]
    pub offset: u64,
    /// The page size the server used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// The link to the next page. Unset on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// One page of a listing: `{ROOT: {"items": [...], "paging": {...}}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// The items, unwrapped.
    pub items: Vec<T>,
    /// Where the page sits in the listing.
    pub paging: Paging,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Wrapped + Deserialize<'de>"))]
struct RawPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<Envelope<T>>,
    #[serde(default)]
    paging: Paging,
}

impl<'de, T: Wrapped + Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawPage::<T>::deserialize(deserializer)?;
        Ok(Page {
            items: raw.items.into_iter().map(Envelope::into_inner).collect(),
            paging: raw.paging,
        })
    }
}

impl<T: PageItem> Wrapped for Page<T> {
    const ROOT: &'static str = T::PAGE_ROOT;
}

impl<T: PageItem + serde::de::DeserializeOwned> DataResponse for Page<T> {}

struct Paginator<F, E, T> {
    fetch_page: F,
    batch: std::vec::IntoIter<T>,
    next_uri: Option<String>,
    off: usize,
    limit: Option<usize>,
    _error: std::marker::PhantomData<fn() -> E>,
}

impl<F, E, T> fmt::Debug for Paginator<F, E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("next_uri", &self.next_uri)
            .field("off", &self.off)
            .field("limit", &self.limit)
            .finish()
    }
}

impl<F, E, T> Iterator for Paginator<F, E, T>
where
    F: FnMut(&str) -> Result<Page<T>, E>,
{
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.limit.is_some_and(|l| self.off >= l) {
                return None;
            }

            if let Some(v) = self.batch.next() {
                self.off += 1;
                return Some(Ok(v));
            }

            let uri = self.next_uri.take()?;
            let Page { items, paging } = match (self.fetch_page)(uri.as_str()) {
                Ok(page) => page,
                Err(e) => return Some(Err(e)),
            };

            // Empty pages are skipped; a self-referencing next link ends the walk.
            self.next_uri = paging.next.filter(|next| *next != uri);
            self.batch = items.into_iter();
        }
    }
}

/// Lazily walk a listing starting at `first_uri`, calling `fetch_page` for
/// each page and following `paging.next` links. Stops after `limit` items,
/// if given, or after the first error.
pub fn paginate<F, E, T>(
    first_uri: impl Into<String>,
    limit: Option<usize>,
    fetch_page: F,
) -> impl Iterator<Item = Result<T, E>>
where
    F: FnMut(&str) -> Result<Page<T>, E>,
{
    Paginator {
        fetch_page,
        batch: Vec::new().into_iter(),
        next_uri: Some(first_uri.into()),
        off: 0,
        limit,
        _error: std::marker::PhantomData,
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;
    use crate::api::{decode, wrapped};

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Item {
        n: u32,
    }

    wrapped!(Item => "item");

    impl PageItem for Item {
        const PAGE_ROOT: &'static str = "items";
    }

    fn page(ns: &[u32], next: Option<&str>) -> Page<Item> {
        Page {
            items: ns.iter().map(|&n| Item { n }).collect(),
            paging: Paging {
                offset: 0,
                limit: None,
                next: next.map(str::to_owned),
            },
        }
    }

    #[test]
    fn decodes_wrapped_items() -> anyhow::Result<()> {
        let body = br#"{"items": {
            "paging": {"offset": 0, "limit": 2, "next": "/gdc/x?offset=2"},
            "items": [{"item": {"n": 1}}, {"item": {"n": 2}}]
        }}"#;

        let page: Page<Item> = decode(&body[..])?;
        assert_eq!(page.items, vec![Item { n: 1 }, Item { n: 2 }]);
        assert_eq!(page.paging.next.as_deref(), Some("/gdc/x?offset=2"));

        Ok(())
    }

    #[test]
    fn follows_next_links_lazily() {
        let mut pages = HashMap::from([
            ("/a", page(&[1, 2], Some("/b"))),
            ("/b", page(&[], Some("/c"))),
            ("/c", page(&[3], None)),
        ]);

        let mut fetched = Vec::new();
        let items: Vec<u32> = paginate("/a", None, |uri: &str| {
            fetched.push(uri.to_owned());
            pages.remove(uri).ok_or("missing page")
        })
        .map(|r| r.map(|i| i.n))
        .collect::<Result<_, _>>()
        .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(fetched, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn limit_stops_fetching() {
        let mut calls = 0;
        let items: Vec<_> = paginate("/a", Some(2), |_: &str| {
            calls += 1;
            Ok::<_, ()>(page(&[1, 2], Some("/a?next")))
        })
        .collect();

        assert_eq!(items.len(), 2);
        assert_eq!(calls, 1);
    }

    #[test]
    fn error_ends_iteration() {
        let mut it = paginate("/a", None, |_: &str| Err::<Page<Item>, _>("boom"));
        assert_eq!(it.next(), Some(Err("boom")));
        assert_eq!(it.next(), None);
    }
}
