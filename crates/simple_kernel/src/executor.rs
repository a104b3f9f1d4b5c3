/*
 * executor.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use async_trait::async_trait;
use himalia::language::executor::Executor;
use himalia::language::executor::MimeBundle;
use himalia::wire::kernel_info_reply::KernelInfo;
use himalia::wire::language_info::LanguageInfo;
use serde_json::json;

/// Stands in for an interpreter: every execution yields the same result.
#[derive(Default)]
pub struct StubExecutor {
    executions: u32,
}

impl StubExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Executor for StubExecutor {
    fn kernel_info(&self) -> KernelInfo {
        KernelInfo {
            implementation: String::from("simple_kernel"),
            implementation_version: String::from(env!("CARGO_PKG_VERSION")),
            language_info: LanguageInfo::plain_text("simple", "0.0.1"),
            banner: String::from("Simple Kernel"),
            help_links: Vec::new(),
        }
    }

    async fn execute(&mut self, code: &str) -> himalia::Result<MimeBundle> {
        self.executions += 1;
        log::debug!("Execution {} ({} bytes of code)", self.executions, code.len());

        let mut bundle = MimeBundle::new();
        bundle.insert(String::from("text/plain"), json!("result!"));
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn test_constant_result() {
        let mut executor = StubExecutor::new();
        let first = block_on(executor.execute("1+1")).unwrap();
        let second = block_on(executor.execute("anything at all")).unwrap();
        assert_eq!(first["text/plain"], json!("result!"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_language_tag() {
        let info = StubExecutor::new().kernel_info();
        assert_eq!(info.language_info.name, "simple");
        assert_eq!(info.implementation, "simple_kernel");
    }
}
