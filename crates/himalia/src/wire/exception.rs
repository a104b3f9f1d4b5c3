/*
 * exception.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

/// A failure reported to the frontend, either from running code or from
/// handling a request. Travels in `error` broadcasts and in error replies.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Exception {
    /// The name of the exception, e.g. `ValueError`
    pub ename: String,

    pub evalue: String,

    /// Traceback frames, as strings. Often empty.
    pub traceback: Vec<String>,
}

impl Exception {
    pub fn new(ename: &str, evalue: impl Into<String>) -> Self {
        Self {
            ename: String::from(ename),
            evalue: evalue.into(),
            traceback: vec![],
        }
    }

    /// Something went wrong on our side rather than in user code
    pub fn internal_error(evalue: String) -> Self {
        Self::new("InternalError", evalue)
    }

    pub fn not_implemented(evalue: impl Into<String>) -> Self {
        Self::new("NotImplementedError", evalue)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_exception_fields_on_the_wire() {
        let exception = Exception::not_implemented("nope");
        assert_eq!(
            serde_json::to_value(&exception).unwrap(),
            json!({"ename": "NotImplementedError", "evalue": "nope", "traceback": []})
        );
    }
}
