//! Plain-text event formatter that tags each line with the ids of its span scope.
//!
//! Lines logged inside a task carry `trace_id` (root span, the `task` span) and `span_id`
//! (innermost span), so one task's lines can be grepped out of a shared log file.

use std::fmt;

use tracing_core::Subscriber;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// `TIMESTAMP [trace_id=X span_id=Y] LEVEL target: fields`; the ids are left out for events
/// outside any span. Span fields (e.g. `task_id`) are printed after the event's own fields.
#[derive(Default)]
pub struct TextWithSpanIds {
    timer: SystemTime,
}

impl TextWithSpanIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S, N> FormatEvent<S, N> for TextWithSpanIds
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing_core::Event<'_>,
    ) -> fmt::Result {
        self.timer.format_time(&mut writer)?;
        if let Some(leaf) = ctx.parent_span() {
            let root_id = ctx
                .event_scope()
                .and_then(|scope| scope.from_root().next())
                .map(|root| root.id().into_u64())
                .unwrap_or_else(|| leaf.id().into_u64());
            write!(writer, " trace_id={} span_id={}", root_id, leaf.id().into_u64())?;
        }
        let meta = event.metadata();
        write!(writer, " {} {}: ", meta.level(), meta.target())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let ext = span.extensions();
                if let Some(fields) = ext.get::<tracing_subscriber::fmt::FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, " {}{{{}}}", span.name(), fields)?;
                    }
                }
            }
        }
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone)]
    struct VecWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for VecWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let sink = Arc::new(Mutex::new(Vec::<u8>::new()));
        let writer = {
            let sink = Arc::clone(&sink);
            move || VecWriter(Arc::clone(&sink))
        };
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(TextWithSpanIds::new())
                .with_writer(writer)
                .with_ansi(false),
        );
        tracing::subscriber::with_default(subscriber, f);
        let out = sink.lock().unwrap().clone();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn task_lines_carry_ids_and_span_fields() {
        let output = capture(|| {
            let span = tracing::info_span!("task", task_id = "t-1");
            let _guard = span.enter();
            tracing::info!(chunks = 3, "input segmented");
        });
        assert!(output.contains("trace_id="));
        assert!(output.contains("span_id="));
        assert!(output.contains("INFO"));
        assert!(output.contains("input segmented chunks=3"));
        assert!(output.contains("task{task_id=\"t-1\"}"));
    }

    #[test]
    fn lines_outside_spans_have_no_ids() {
        let output = capture(|| tracing::warn!("standalone"));
        assert!(!output.contains("trace_id="));
        assert!(output.contains("WARN"));
        assert!(output.contains("standalone"));
    }
}
