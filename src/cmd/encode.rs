//! `wayfarer encode` / `wayfarer decode` — work with gateway paths offline.

use crate::cli::{DecodeArgs, EncodeArgs};
use crate::error::WayfarerError;
use crate::proxy::target;

#[must_use]
pub fn gateway_path(url: &str) -> String {
    format!("/proxy/{}/", target::encode(url))
}

pub fn encode(args: &EncodeArgs) {
    println!("{}", gateway_path(&args.url));
}

pub fn decode(args: &DecodeArgs) -> Result<(), WayfarerError> {
    let segment = args
        .segment
        .trim_start_matches("/proxy/")
        .trim_end_matches('/');
    let origin = target::resolve(segment)?;
    println!("{origin}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_path_round_trips_through_resolver() {
        let path = gateway_path("example.com/docs");
        let segment = path
            .strip_prefix("/proxy/")
            .and_then(|p| p.strip_suffix('/'))
            .unwrap();
        assert!(!segment.contains('/'));
        assert_eq!(
            target::resolve(segment).unwrap().as_str(),
            "https://example.com/docs"
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        let args = DecodeArgs {
            segment: "***".into(),
        };
        assert!(decode(&args).is_err());
    }
}
