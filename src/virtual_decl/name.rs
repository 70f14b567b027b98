//! Naming convention for virtual declaration units and expanded output.
//!
//! A declaration unit lives next to its owning file so the host resolves it
//! with the same project configuration:
//!
//! - `file:///project/src/user.ts` → `file:///project/src/user.expanded.d.ts`
//! - `file:///project/Makefile` → `file:///project/Makefile.expanded.d`
//!
//! For "cannot-be-a-base" URIs (untitled:, mailto:, data:) a
//! `utsushi:///virtual/{encoded owner}/{name}` fallback is used.

use url::Url;

/// Marker inserted between a file stem and its extension by the expander.
pub const EXPANDED_INFIX: &str = ".expanded";

/// Marker for generated declaration units.
pub const DECLARATION_INFIX: &str = ".expanded.d";

/// Derive the virtual declaration unit name for an owning file.
pub fn virtual_name_of(owner: &Url) -> Url {
    let file_name = owner
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("untitled");
    let virtual_file = declaration_file_name(file_name);

    let mut url = owner.clone();
    let modified = url
        .path_segments_mut()
        .map(|mut segments| {
            segments.pop();
            segments.push(&virtual_file);
        })
        .is_ok();
    if modified {
        url.set_query(None);
        url.set_fragment(None);
        return url;
    }

    let encoded_owner =
        percent_encoding::utf8_percent_encode(owner.as_str(), percent_encoding::NON_ALPHANUMERIC);
    let decl_name = declaration_file_name(owner.path());
    let fallback = format!(
        "utsushi:///virtual/{encoded_owner}/{}",
        percent_encoding::utf8_percent_encode(&decl_name, percent_encoding::NON_ALPHANUMERIC)
    );
    // Built only from a fixed scheme and percent-encoded segments.
    Url::parse(&fallback).unwrap_or_else(|_| owner.clone())
}

/// Whether a file name follows the expanded-output or declaration naming
/// convention. Such files are produced by the expander and never expanded
/// again.
pub fn is_expander_output(file: &Url) -> bool {
    if file.scheme() == "utsushi" {
        return true;
    }
    let Some(name) = file.path_segments().and_then(|mut s| s.next_back()) else {
        return false;
    };
    name.contains(&format!("{EXPANDED_INFIX}."))
        || name.ends_with(EXPANDED_INFIX)
        || name.ends_with(DECLARATION_INFIX)
}

fn declaration_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => {
            format!("{stem}{DECLARATION_INFIX}.{extension}")
        }
        _ => format!("{file_name}{DECLARATION_INFIX}"),
    }
}
