use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;

use crate::site::Site;

static SITE: OnceCell<Site> = OnceCell::new();

/// Install the process-wide site. Fails when called twice.
pub fn init(site: Site) -> Result<&'static Site> {
    SITE.set(site)
        .map_err(|_| anyhow!("site already initialized"))?;
    SITE.get().ok_or_else(|| anyhow!("site not initialized"))
}
