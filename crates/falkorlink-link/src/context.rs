//! Per-call team/site identity.

use falkorlink_state::KEY_SEPARATOR;

use crate::error::{LinkError, LinkResult};

/// The (team, site) pair every operation is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteContext {
    pub team_id: String,
    pub site_id: String,
}

impl SiteContext {
    /// Build a context from optional caller-supplied ids.
    pub fn new(team_id: Option<&str>, site_id: Option<&str>) -> LinkResult<Self> {
        Ok(Self {
            team_id: parse_id(team_id, "teamId")?,
            site_id: parse_id(site_id, "siteId")?,
        })
    }
}

/// Ids become `/`-joined storage keys, so a separator inside one would alias another site.
fn parse_id(raw: Option<&str>, field: &'static str) -> LinkResult<String> {
    let id = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(LinkError::MissingContext(field))?;
    if id.contains(KEY_SEPARATOR) {
        return Err(LinkError::InvalidContext(field));
    }
    Ok(id.to_string())
}
