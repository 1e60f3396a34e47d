use fncache::{Arg, derive_key};
use serde_json::Value;

/// Derive the default cache key for command-line arguments
///
/// Each argument is read as JSON; anything that does not parse is used as a
/// plain string, so `fncache key tiny tim` works without quoting.
pub fn derive(raw: &[String]) -> String {
    let args: Vec<Arg> = raw
        .iter()
        .map(|text| {
            serde_json::from_str::<Value>(text)
                .map_or_else(|_| Arg::String(text.clone()), Arg::from)
        })
        .collect();
    tracing::debug!(count = args.len(), "Deriving key for arguments");
    derive_key(&args)
}
