use serde_json::json;
use widget_sync_runtime::{
    App, CallbackArgs, CallbackBinding, RerunError, ScriptContext, SessionState, WidgetOptions, WireValue,
};

const CLICKS: &str = "clicks";

#[derive(Debug, Default)]
pub struct DemoApp {
    reruns: u64,
}

impl App for DemoApp {
    fn script(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), RerunError> {
        self.reruns += 1;

        ctx.download_button(
            "Download button label",
            "Hello world!",
            "hello.txt",
            None,
            WidgetOptions::new(),
        )?;
        ctx.download_button(
            "Download button label",
            "Hello world!",
            "hello.txt",
            None,
            WidgetOptions::new().disabled(true),
        )?;
        ctx.download_button(
            "Download RAR archive file",
            &b"bytes"[..],
            "archive.rar",
            Some("application/vnd.rar"),
            WidgetOptions::new(),
        )?;

        if let Some(key) = ctx.keypress("Press a key", WidgetOptions::new().key("keys"))? {
            ctx.text(&format!("You pressed {key}"));
        }

        let count = CallbackBinding::new(increment).kwarg("step", json!(1));
        ctx.button("Count", WidgetOptions::new().on_change(count))?;
        let clicks = match ctx.session_state().get(CLICKS) {
            Some(WireValue::Int(clicks)) => *clicks,
            _ => 0,
        };
        ctx.text(&format!("Clicked {clicks} times"));

        ctx.checkpoint()?;

        let (name, subscribed) = ctx.form("signup", |form| {
            let name = form.text_input("Name", "", Some(40), WidgetOptions::new().key("name"))?;
            let subscribed = form.checkbox("Subscribe", false, WidgetOptions::new())?;
            form.form_submit_button(
                "Sign up",
                WidgetOptions::new().help("Sends the form to the server"),
            )?;
            Ok((name, subscribed))
        })?;
        if !name.is_empty() {
            let note = if subscribed { " (subscribed)" } else { "" };
            ctx.text(&format!("Signed up as {name}{note}"));
        }

        ctx.text(&format!("Run {}", self.reruns));
        Ok(())
    }
}

fn increment(args: &CallbackArgs, state: &mut SessionState) -> anyhow::Result<()> {
    let step = args
        .kwargs
        .get("step")
        .and_then(|step| step.as_i64())
        .ok_or_else(|| anyhow::anyhow!("missing step argument"))?;
    let clicks = match state.get(CLICKS) {
        Some(WireValue::Int(clicks)) => *clicks,
        _ => 0,
    };
    state.set(CLICKS, WireValue::Int(clicks + step));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use widget_sync_runtime::{PendingUpdate, Session, WidgetId};

    fn texts(elements: &[widget_sync_runtime::ElementDescription]) -> Vec<String> {
        elements
            .iter()
            .filter(|element| element.kind == "text")
            .filter_map(|element| match &element.value {
                Some(WireValue::String(text)) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn demo_counts_clicks() {
        let mut app = DemoApp::default();
        let mut session = Session::default();

        let first = session.rerun(|ctx| app.script(ctx)).expect("first rerun");
        assert!(texts(&first.elements).contains(&"Clicked 0 times".to_string()));
        assert_eq!(first.elements.len(), 11);

        let count = first
            .elements
            .iter()
            .find(|element| element.label == "Count")
            .map(|element| WidgetId::from(element.id.as_str()))
            .expect("count button");
        session.enqueue(PendingUpdate {
            id: count,
            value: WireValue::Bool(true),
        });

        let second = session.rerun(|ctx| app.script(ctx)).expect("second rerun");
        assert!(texts(&second.elements).contains(&"Clicked 1 times".to_string()));
        assert!(texts(&second.elements).contains(&"Run 2".to_string()));
    }
}
