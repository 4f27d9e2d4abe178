//! Asset manifest: the resources every generation must hold after install.

use url::Url;

use crate::Error;
use crate::request::ResourceId;

/// Ordered, de-duplicated list of resources to pre-populate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    entries: Vec<ResourceId>,
}

impl AssetManifest {
    /// Resolve every identifier against the scope.
    ///
    /// Order is preserved; later duplicates of the same identity are dropped.
    pub fn resolve<S: AsRef<str>>(scope: &Url, assets: &[S]) -> Result<Self, Error> {
        let mut entries: Vec<ResourceId> = Vec::with_capacity(assets.len());
        for asset in assets {
            let id = ResourceId::resolve(scope, asset.as_ref())?;
            if !entries.contains(&id) {
                entries.push(id);
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ResourceId] {
        &self.entries
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.entries.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
