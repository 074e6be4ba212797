use crate::callback::CallbackBinding;
use crate::codec::{
    CheckboxCodec, KeypressCodec, NumberCodec, SelectCodec, TextInputCodec, TriggerCodec,
    WidgetCodec,
};
use crate::context::ScriptContext;
use crate::engine::WidgetRegistration;
use crate::error::{WidgetError, WidgetResult};
use crate::form::FormRole;
use crate::value::WireValue;
use serde::Serialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

const BUTTON: TriggerCodec = TriggerCodec::new("button");
const FORM_SUBMIT_BUTTON: TriggerCodec = TriggerCodec::new("form_submit_button");
const DOWNLOAD_BUTTON: TriggerCodec = TriggerCodec::new("download_button");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementDescription {
    pub kind: String,
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub disabled: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub form_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<WireValue>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub props: Value,
}

impl ElementDescription {
    pub(crate) fn container(kind: &str, id: &str, props: Value) -> Self {
        Self {
            kind: kind.to_string(),
            id: id.to_string(),
            label: String::new(),
            help: None,
            disabled: false,
            form_id: String::new(),
            value: None,
            props,
        }
    }
}

#[derive(Debug, Default)]
pub struct WidgetOptions {
    pub key: Option<String>,
    pub help: Option<String>,
    pub disabled: bool,
    pub on_change: Option<CallbackBinding>,
}

impl WidgetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn on_change(mut self, binding: CallbackBinding) -> Self {
        self.on_change = Some(binding);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadData {
    Text(String),
    Bytes(Vec<u8>),
}

impl DownloadData {
    fn as_bytes(&self) -> &[u8] {
        match self {
            DownloadData::Text(text) => text.as_bytes(),
            DownloadData::Bytes(bytes) => bytes,
        }
    }

    fn default_mime(&self) -> &'static str {
        match self {
            DownloadData::Text(_) => "text/plain",
            DownloadData::Bytes(_) => "application/octet-stream",
        }
    }
}

impl From<&str> for DownloadData {
    fn from(text: &str) -> Self {
        DownloadData::Text(text.to_string())
    }
}

impl From<&[u8]> for DownloadData {
    fn from(bytes: &[u8]) -> Self {
        DownloadData::Bytes(bytes.to_vec())
    }
}

struct Declaration<'a, C: WidgetCodec> {
    codec: &'a C,
    label: &'a str,
    role: FormRole,
    writes_allowed: bool,
    default: Option<C::Value>,
    props: Value,
}

impl ScriptContext<'_> {
    fn declare<C: WidgetCodec>(
        &mut self,
        decl: Declaration<'_, C>,
        options: WidgetOptions,
    ) -> WidgetResult<C::Value> {
        let WidgetOptions {
            key,
            help,
            disabled,
            on_change,
        } = options;

        let registered = self.engine.register(
            WidgetRegistration {
                codec: decl.codec,
                label: decl.label,
                user_key: key.as_deref(),
                role: decl.role,
                writes_allowed: decl.writes_allowed,
                default: decl.default,
                callback: on_change,
            },
            &self.group,
        )?;

        let form_id = self.group.group_id().unwrap_or_default().to_string();
        self.elements.push(ElementDescription {
            kind: decl.codec.type_tag().to_string(),
            id: registered.id.to_string(),
            label: decl.label.to_string(),
            help,
            disabled,
            form_id,
            value: Some(decl.codec.serialize(&registered.value)),
            props: decl.props,
        });
        Ok(registered.value)
    }

    pub fn text(&mut self, body: &str) {
        self.elements.push(ElementDescription {
            value: Some(WireValue::String(body.to_string())),
            ..ElementDescription::container("text", "", Value::Null)
        });
    }

    /// True on the rerun right after the button was clicked.
    pub fn button(&mut self, label: &str, options: WidgetOptions) -> WidgetResult<bool> {
        self.declare(
            Declaration {
                codec: &BUTTON,
                label,
                role: FormRole::Standalone,
                writes_allowed: false,
                default: None,
                props: json!({ "is_form_submitter": false }),
            },
            options,
        )
    }

    pub fn form_submit_button(&mut self, label: &str, options: WidgetOptions) -> WidgetResult<bool> {
        self.declare(
            Declaration {
                codec: &FORM_SUBMIT_BUTTON,
                label,
                role: FormRole::Submitter,
                writes_allowed: false,
                default: None,
                props: json!({ "is_form_submitter": true }),
            },
            options,
        )
    }

    /// The key pressed on the last interaction, `None` otherwise.
    pub fn keypress(&mut self, label: &str, options: WidgetOptions) -> WidgetResult<Option<String>> {
        self.declare(
            Declaration {
                codec: &KeypressCodec,
                label,
                role: FormRole::Standalone,
                writes_allowed: false,
                default: None,
                props: json!({ "is_form_submitter": false }),
            },
            options,
        )
    }

    pub fn download_button(
        &mut self,
        label: &str,
        data: impl Into<DownloadData>,
        file_name: &str,
        mime: Option<&str>,
        options: WidgetOptions,
    ) -> WidgetResult<bool> {
        let data = data.into();
        let bytes = data.as_bytes();
        let digest = Sha256::digest(bytes);
        let mut file_id = String::with_capacity(digest.len() * 2);
        for b in digest {
            file_id.push_str(&format!("{:02x}", b));
        }

        self.declare(
            Declaration {
                codec: &DOWNLOAD_BUTTON,
                label,
                role: FormRole::Standalone,
                writes_allowed: false,
                default: None,
                props: json!({
                    "file_name": file_name,
                    "mime": mime.unwrap_or(data.default_mime()),
                    "file_id": file_id,
                    "size": bytes.len(),
                }),
            },
            options,
        )
    }

    pub fn checkbox(&mut self, label: &str, value: bool, options: WidgetOptions) -> WidgetResult<bool> {
        self.declare(
            Declaration {
                codec: &CheckboxCodec,
                label,
                role: FormRole::Member,
                writes_allowed: true,
                default: Some(value),
                props: Value::Null,
            },
            options,
        )
    }

    pub fn text_input(
        &mut self,
        label: &str,
        value: &str,
        max_chars: Option<usize>,
        options: WidgetOptions,
    ) -> WidgetResult<String> {
        self.declare(
            Declaration {
                codec: &TextInputCodec { max_chars },
                label,
                role: FormRole::Member,
                writes_allowed: true,
                default: Some(value.to_string()),
                props: json!({ "max_chars": max_chars }),
            },
            options,
        )
    }

    pub fn number_input(&mut self, label: &str, value: f64, options: WidgetOptions) -> WidgetResult<f64> {
        self.declare(
            Declaration {
                codec: &NumberCodec,
                label,
                role: FormRole::Member,
                writes_allowed: true,
                default: Some(value),
                props: Value::Null,
            },
            options,
        )
    }

    /// `index` picks the initial option; `None` starts with nothing selected.
    /// An empty option list always yields `None`.
    pub fn selectbox(
        &mut self,
        label: &str,
        options_list: &[&str],
        index: Option<usize>,
        options: WidgetOptions,
    ) -> WidgetResult<Option<String>> {
        let codec = SelectCodec::new(options_list.iter().copied());
        let default = match index {
            Some(index) if !options_list.is_empty() => match codec.options().get(index) {
                Some(option) => Some(option.clone()),
                None => {
                    return Err(WidgetError::InvalidArgument {
                        widget: codec.type_tag().to_string(),
                        reason: format!(
                            "index {index} is out of range for {} options",
                            options_list.len()
                        ),
                    });
                }
            },
            _ => None,
        };
        self.declare(
            Declaration {
                codec: &codec,
                label,
                role: FormRole::Member,
                writes_allowed: true,
                default: Some(default),
                props: json!({ "options": options_list, "index": index }),
            },
            options,
        )
    }
}
