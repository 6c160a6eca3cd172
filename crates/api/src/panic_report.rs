//! Where did the operation panic?
//!
//! `catch_unwind` only hands back the payload. A panic hook records location
//! and backtrace on the panicking thread; the dispatcher polls the operation
//! on that same thread, so it can pick the report up right after the unwind.

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, PanicHookInfo};
use std::sync::Once;

thread_local! {
    static LAST_PANIC: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Chain the recording hook in front of the current one. Idempotent.
pub fn install() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            record(info);
            previous(info);
        }));
    });
}

fn record(info: &PanicHookInfo<'_>) {
    let location = info
        .location()
        .map(ToString::to_string)
        .unwrap_or_else(|| "<unknown location>".to_string());
    let report = format!(
        "panicked at {location}\n\nStack backtrace:\n{}",
        Backtrace::force_capture()
    );
    LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(report));
}

/// Report left by the latest panic on this thread, if any.
pub fn take() -> Option<String> {
    LAST_PANIC.with(|slot| slot.borrow_mut().take())
}
