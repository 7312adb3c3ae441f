use anyhow::Result;
use regex::Regex;

/// Content-similarity license matching: file bytes in, `(license id, confidence)` out.
pub trait ContentMatcher {
    fn match_content(&self, content: &[u8]) -> Vec<(String, f32)>;
}

/// Distinctive wording of one license, pre-normalized (see [`normalize`]).
struct Reference {
    id: &'static str,
    /// Confidence is the fraction of these phrases present in the text.
    phrases: &'static [&'static str],
    /// Any of these present means the text is a different license.
    excludes: &'static [&'static str],
}

const GPL_PREAMBLE: &str = "everyone is permitted to copy and distribute verbatim copies";
const BSD_SOURCE: &str = "redistributions of source code must retain the above copyright notice";
const BSD_BINARY: &str = "redistributions in binary form must reproduce the above copyright notice";
const BSD_GRANT: &str = "redistribution and use in source and binary forms with or without modification are permitted provided that the following conditions are met";
const ISC_GRANT: &str = "permission to use copy modify and or distribute this software for any purpose with or without fee is hereby granted";
const ISC_DISCLAIMER: &str = "the software is provided as is and the author disclaims all warranties";

const REFERENCES: &[Reference] = &[
    Reference {
        id: "MIT",
        phrases: &[
            "permission is hereby granted free of charge to any person obtaining a copy",
            "to deal in the software without restriction",
            "the above copyright notice and this permission notice shall be included in all copies or substantial portions of the software",
            "the software is provided as is without warranty of any kind",
        ],
        excludes: &[],
    },
    Reference {
        id: "ISC",
        phrases: &[
            ISC_GRANT,
            "provided that the above copyright notice and this permission notice appear in all copies",
            ISC_DISCLAIMER,
        ],
        excludes: &[],
    },
    Reference {
        id: "0BSD",
        phrases: &[ISC_GRANT, ISC_DISCLAIMER],
        excludes: &["appear in all copies"],
    },
    Reference {
        id: "BSD-3-Clause",
        phrases: &[BSD_GRANT, BSD_SOURCE, BSD_BINARY, "neither the name of"],
        excludes: &["all advertising materials"],
    },
    Reference {
        id: "BSD-2-Clause",
        phrases: &[BSD_GRANT, BSD_SOURCE, BSD_BINARY],
        excludes: &["neither the name of", "all advertising materials"],
    },
    Reference {
        id: "Apache-2.0",
        phrases: &[
            "apache license",
            "version 2 0",
            "grant of copyright license",
            "grant of patent license",
            "licensed under the apache license version 2 0",
        ],
        excludes: &[],
    },
    Reference {
        id: "MPL-2.0",
        phrases: &[
            "mozilla public license version 2 0",
            "covered software",
            "this source code form is subject to the terms of the mozilla public license v 2 0",
        ],
        excludes: &[],
    },
    Reference {
        id: "GPL-2.0",
        phrases: &["gnu general public license version 2 june 1991", GPL_PREAMBLE],
        excludes: &[],
    },
    Reference {
        id: "GPL-3.0",
        phrases: &[
            "gnu general public license version 3 29 june 2007",
            GPL_PREAMBLE,
            "the gnu general public license is a free copyleft license for software",
        ],
        excludes: &[],
    },
    Reference {
        id: "LGPL-2.1",
        phrases: &["gnu lesser general public license version 2 1 february 1999", GPL_PREAMBLE],
        excludes: &[],
    },
    Reference {
        id: "LGPL-3.0",
        phrases: &[
            "gnu lesser general public license version 3 29 june 2007",
            "incorporates the terms and conditions of version 3 of the gnu general public license",
        ],
        excludes: &[],
    },
    Reference {
        id: "AGPL-3.0",
        phrases: &[
            "gnu affero general public license version 3 19 november 2007",
            "remote network interaction",
        ],
        excludes: &[],
    },
    Reference {
        id: "EPL-2.0",
        phrases: &["eclipse public license v 2 0", "secondary license"],
        excludes: &[],
    },
    Reference {
        id: "Unlicense",
        phrases: &[
            "this is free and unencumbered software released into the public domain",
            "for more information please refer to http unlicense org",
        ],
        excludes: &[],
    },
    Reference {
        id: "CC0-1.0",
        phrases: &["creative commons legal code", "cc0 1 0 universal"],
        excludes: &[],
    },
    Reference {
        id: "BSL-1.0",
        phrases: &["boost software license version 1 0 august 17th 2003"],
        excludes: &[],
    },
    Reference {
        id: "Zlib",
        phrases: &[
            "this software is provided as is without any express or implied warranty",
            "the origin of this software must not be misrepresented",
            "altered source versions must be plainly marked as such",
        ],
        excludes: &[],
    },
];

/// Built-in matcher scoring text against known license wording.
///
/// An `SPDX-License-Identifier:` tag is taken at face value with confidence 1.0.
pub struct PhraseMatcher {
    threshold: f32,
    spdx_tag: Regex,
}

impl PhraseMatcher {
    pub fn new(threshold: f32) -> Result<Self> {
        Ok(Self {
            threshold,
            spdx_tag: Regex::new(r"SPDX-License-Identifier:\s*([A-Za-z0-9.+\-]+)")?,
        })
    }
}

impl ContentMatcher for PhraseMatcher {
    fn match_content(&self, content: &[u8]) -> Vec<(String, f32)> {
        let text = String::from_utf8_lossy(content);
        let mut matches: Vec<(String, f32)> = Vec::new();

        for cap in self.spdx_tag.captures_iter(&text) {
            let id = cap[1].to_string();
            if !matches.iter().any(|(m, _)| *m == id) {
                matches.push((id, 1.0));
            }
        }

        let normalized = normalize(&text);
        for reference in REFERENCES {
            let confidence = score(reference, &normalized);
            if confidence < self.threshold || confidence <= 0.0 {
                continue;
            }
            match matches.iter_mut().find(|(m, _)| m == reference.id) {
                Some(existing) => existing.1 = existing.1.max(confidence),
                None => matches.push((reference.id.to_string(), confidence)),
            }
        }

        // Equal scores favour the license with more obligations, so a copyleft
        // text carrying an appended permissive notice stays copyleft.
        matches.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| obligation(&b.0).cmp(&obligation(&a.0)))
        });
        matches
    }
}

/// Relative weight of what a license asks of redistributors.
fn obligation(id: &str) -> u8 {
    let id = id.strip_prefix("deprecated_").unwrap_or(id);
    if id.starts_with("AGPL") {
        4
    } else if id.starts_with("GPL") {
        3
    } else if id.starts_with("LGPL") {
        2
    } else if id.starts_with("MPL") || id.starts_with("EPL") {
        1
    } else {
        0
    }
}

fn score(reference: &Reference, normalized: &str) -> f32 {
    if reference.excludes.iter().any(|p| normalized.contains(p)) {
        return 0.0;
    }
    let found = reference
        .phrases
        .iter()
        .filter(|p| normalized.contains(*p))
        .count();
    found as f32 / reference.phrases.len() as f32
}

/// Lowercase, with every run of non-alphanumeric characters collapsed to one space.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}
