/*
 * mod.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use async_trait::async_trait;
use crossbeam::channel::Receiver;
use crossbeam::channel::Sender;
use himalia::error::Error;
use himalia::language::executor::Executor;
use himalia::language::executor::MimeBundle;
use himalia::wire::exception::Exception;
use himalia::wire::kernel_info_reply::KernelInfo;
use himalia::wire::language_info::LanguageInfo;
use serde_json::json;

/// Echoes code back as its result. The code `error` fails.
pub struct EchoExecutor;

#[async_trait]
impl Executor for EchoExecutor {
    fn kernel_info(&self) -> KernelInfo {
        KernelInfo {
            implementation: String::from("test"),
            implementation_version: String::from("0.1.0"),
            language_info: LanguageInfo::plain_text("Test", "0.1.0"),
            banner: String::from("Himalia test kernel"),
            help_links: Vec::new(),
        }
    }

    async fn execute(&mut self, code: &str) -> himalia::Result<MimeBundle> {
        if code == "error" {
            return Err(Error::Execution(Exception {
                ename: String::from("TestError"),
                evalue: String::from("Some error"),
                traceback: vec![String::from("at line 1")],
            }));
        }

        let mut bundle = MimeBundle::new();
        bundle.insert(String::from("text/plain"), json!(code));
        Ok(bundle)
    }
}

/// Holds every execution until released: signals `started`, then waits for
/// a message on `release`.
pub struct BlockingExecutor {
    pub started: Sender<()>,
    pub release: Receiver<()>,
}

#[async_trait]
impl Executor for BlockingExecutor {
    fn kernel_info(&self) -> KernelInfo {
        EchoExecutor.kernel_info()
    }

    async fn execute(&mut self, code: &str) -> himalia::Result<MimeBundle> {
        self.started.send(()).unwrap();
        self.release.recv().unwrap();
        let mut echo = EchoExecutor;
        echo.execute(code).await
    }
}
