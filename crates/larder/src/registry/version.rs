/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Version policy.
//!
//! A package's stored version only ever increases. A candidate is accepted
//! iff it is strictly greater than the stored version under semantic-version
//! ordering (numeric segment-wise, not lexical); the first submission of a
//! name always passes. There is no republish-same-version path.

use semver::Version;

/// Parses a version string leniently.
///
/// Accepts an optional leading `v` and pads missing numeric segments with
/// zeros (`"1.2"` parses as `1.2.0`), so descriptors written against
/// two-segment schemes still order correctly.
pub fn parse_lenient(input: &str) -> Result<Version, semver::Error> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    match Version::parse(trimmed) {
        Ok(version) => Ok(version),
        Err(first_error) => {
            let (base, suffix) = split_suffix(trimmed);
            let segments = base.chars().filter(|c| *c == '.').count();
            if segments >= 2 {
                return Err(first_error);
            }
            let mut padded = base.to_string();
            for _ in segments..2 {
                padded.push_str(".0");
            }
            padded.push_str(suffix);
            Version::parse(&padded).map_err(|_| first_error)
        }
    }
}

fn split_suffix(input: &str) -> (&str, &str) {
    match input.find(['-', '+']) {
        Some(index) => input.split_at(index),
        None => (input, ""),
    }
}

/// Returns true when the candidate strictly supersedes the current version.
pub fn is_newer(candidate: &Version, current: &Version) -> bool {
    candidate > current
}

/// Version policy gate: absent current version always accepts, otherwise
/// the candidate must be strictly newer. Equal versions are rejected.
pub fn accepts(candidate: &Version, current: Option<&Version>) -> bool {
    match current {
        None => true,
        Some(current) => is_newer(candidate, current),
    }
}
