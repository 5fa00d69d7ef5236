//! 共享测试工具和辅助函数

#![allow(dead_code)]

use cloud_orchestrator_provider::{
    Driver, DriverCredentials, DriverOptions, PollOptions, builtin_modules,
};
use serde_json::Value;
use wiremock::ResponseTemplate;

/// 断言 `Option` 为 `Some`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 指向 mock server 的选项：1 秒轮询间隔、10 秒超时、不重试
pub fn mock_options(uri: &str) -> DriverOptions {
    let mut options = DriverOptions::with_host(uri);
    options.poll = PollOptions {
        interval_secs: 1,
        timeout_secs: 10,
        not_found_means_done: false,
    };
    options.connection.max_retries = 0;
    options
}

/// JSON 响应
pub fn json(status: u16, body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

/// 通过内置模块表按 locator + 类名实例化驱动
pub fn instantiate(
    locator: &str,
    class_name: &str,
    credentials: DriverCredentials,
    options: &DriverOptions,
) -> Option<cloud_orchestrator_provider::Result<Driver>> {
    let (_, load) = builtin_modules()
        .into_iter()
        .find(|(l, _)| *l == locator)?;
    let module = load().ok()?;
    let class = module.class(class_name)?;
    Some(class.instantiate(credentials, options))
}
