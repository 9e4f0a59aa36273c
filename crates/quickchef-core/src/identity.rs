//! Request identity: the cache and deduplication key for a cooking request.
//!
//! Two requests are equivalent when persona, goals, diet, pantry
//! (`name:locked` pairs), dislikes, effort and protein level match, with list
//! order ignored. Time available, kitchen setup, day type, budget and day
//! count are deliberately left out, so equivalent requests that differ only in
//! those fields share a cached plan.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::model::CookingRequest;

/// Deterministic identity string derived from a [`CookingRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestIdentity(String);

impl RequestIdentity {
    /// Derive the identity of `request`.
    pub fn of(request: &CookingRequest) -> Self {
        let mut goals: Vec<&str> = request.goals.iter().map(|g| g.as_str()).collect();
        goals.sort_unstable();

        let mut ingredients: Vec<String> = request
            .ingredients
            .iter()
            .map(|i| format!("{}:{}", i.name, i.locked))
            .collect();
        ingredients.sort_unstable();

        let mut dislikes: Vec<&str> = request.dislikes.iter().map(String::as_str).collect();
        dislikes.sort_unstable();

        let projection = serde_json::json!({
            "persona": request.persona.as_str(),
            "goals": goals,
            "diet": request.diet.as_str(),
            "ingredients": ingredients,
            "dislikes": dislikes,
            "effort": request.effort_level.as_str(),
            "protein": request.protein_level.as_str(),
        });
        Self(projection.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short hex digest of the identity, for log fields.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..6])
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shorthand for [`RequestIdentity::of`].
pub fn identity(request: &CookingRequest) -> RequestIdentity {
    RequestIdentity::of(request)
}
