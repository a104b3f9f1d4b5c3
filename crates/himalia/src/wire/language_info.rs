/*
 * language_info.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

/// The language an executor runs, as advertised in `kernel_info_reply`
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LanguageInfo {
    /// The name of the programming language the kernel implements
    pub name: String,

    /// The version of the language
    pub version: String,

    /// The MIME type for script files in the language
    pub mimetype: String,

    /// The file extension for script files in the language
    pub file_extension: String,

    /// Pygments lexer (for highlighting), if different than `name`
    pub pygments_lexer: Option<String>,

    /// Codemirror mode (for editing), if different than `name`
    pub codemirror_mode: Option<String>,

    /// Nbconvert exporter, if not the default 'script' exporter
    pub nbconvert_exporter: Option<String>,
}

impl LanguageInfo {
    /// A plain-text language: `text/plain` scripts with a `.txt` extension
    /// and no highlighting hints.
    pub fn plain_text(name: &str, version: &str) -> Self {
        Self {
            name: String::from(name),
            version: String::from(version),
            mimetype: String::from("text/plain"),
            file_extension: String::from(".txt"),
            pygments_lexer: None,
            codemirror_mode: None,
            nbconvert_exporter: None,
        }
    }
}
