//! Unknown target ids are skipped with a warning.
//!
//! Kept in its own test binary so the thread-local subscriber only sees
//! events from this execution.

use laminar_middleware::{
    BoxFuture, ConfigureOptions, MiddlewareDefinition, MiddlewareEngine, RegisterOptions,
};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log lines in memory.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn terminal<'a>(ctx: &'a mut Vec<String>) -> BoxFuture<'a, anyhow::Result<usize>> {
    Box::pin(async move { Ok(ctx.len()) })
}

#[tokio::test]
async fn test_unknown_target_logs_warning() {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let engine = MiddlewareEngine::<Vec<String>, usize>::new();
    engine.configure(ConfigureOptions::new().enable_trace(true));
    engine.register(
        "known",
        MiddlewareDefinition::<Vec<String>, usize>::function(|ctx, next| {
            Box::pin(async move {
                ctx.push("known".to_string());
                next.run(ctx).await
            })
        }),
        RegisterOptions::new().priority(1),
    );

    let mut ctx = Vec::new();
    let envelope = engine
        .execute(&mut ctx, &["missing", "known"], terminal)
        .await
        .unwrap();

    assert_eq!(envelope.result, 1);
    let output = captured.contents();
    let warnings: Vec<_> = output
        .lines()
        .filter(|line| line.contains("unknown middleware requested"))
        .collect();
    assert_eq!(warnings.len(), 1, "captured: {output}");
    assert!(warnings[0].contains("WARN"));
    assert!(warnings[0].contains("missing"));
}

#[tokio::test]
async fn test_known_targets_log_nothing_at_warn() {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let engine = MiddlewareEngine::<Vec<String>, usize>::new();
    engine.register_fn(
        "known",
        |ctx, next| Box::pin(async move { next.run(ctx).await }),
        RegisterOptions::new(),
    );

    let mut ctx = Vec::new();
    engine.execute(&mut ctx, &["known"], terminal).await.unwrap();

    assert!(captured.contents().is_empty());
}
