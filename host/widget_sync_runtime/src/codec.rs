use crate::error::CodecError;
use crate::value::{WireKind, WireValue};
use std::fmt::Debug;

/// Implementations must be deterministic: equal values serialize identically and
/// a given wire value always decodes to the same value or is always rejected.
pub trait WidgetCodec {
    type Value: Clone + PartialEq + Debug;

    fn type_tag(&self) -> &str;

    fn serialize(&self, value: &Self::Value) -> WireValue;

    fn deserialize(&self, wire: &WireValue) -> Result<Self::Value, CodecError>;

    fn default_value(&self) -> Self::Value;

    fn is_trigger(&self) -> bool {
        false
    }
}

fn unexpected(expected: WireKind, wire: &WireValue) -> CodecError {
    CodecError::UnexpectedKind {
        expected,
        found: wire.kind(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TriggerCodec {
    tag: &'static str,
}

impl TriggerCodec {
    pub const fn new(tag: &'static str) -> Self {
        Self { tag }
    }
}

impl WidgetCodec for TriggerCodec {
    type Value = bool;

    fn type_tag(&self) -> &str {
        self.tag
    }

    fn serialize(&self, value: &bool) -> WireValue {
        WireValue::Bool(*value)
    }

    fn deserialize(&self, wire: &WireValue) -> Result<bool, CodecError> {
        match wire {
            WireValue::Bool(value) => Ok(*value),
            other => Err(unexpected(WireKind::Bool, other)),
        }
    }

    fn default_value(&self) -> bool {
        false
    }

    fn is_trigger(&self) -> bool {
        true
    }
}

/// Last key pressed by the client. An empty key is the same as no key, so
/// `Some("")` decodes back as `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeypressCodec;

impl KeypressCodec {
    pub const ABSENT: &'static str = "";
}

impl WidgetCodec for KeypressCodec {
    type Value = Option<String>;

    fn type_tag(&self) -> &str {
        "keypress"
    }

    fn serialize(&self, value: &Option<String>) -> WireValue {
        WireValue::String(value.as_deref().unwrap_or(Self::ABSENT).to_string())
    }

    fn deserialize(&self, wire: &WireValue) -> Result<Option<String>, CodecError> {
        match wire {
            WireValue::String(key) if key == Self::ABSENT => Ok(None),
            WireValue::String(key) => Ok(Some(key.clone())),
            other => Err(unexpected(WireKind::String, other)),
        }
    }

    fn default_value(&self) -> Option<String> {
        None
    }

    fn is_trigger(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckboxCodec;

impl WidgetCodec for CheckboxCodec {
    type Value = bool;

    fn type_tag(&self) -> &str {
        "checkbox"
    }

    fn serialize(&self, value: &bool) -> WireValue {
        WireValue::Bool(*value)
    }

    fn deserialize(&self, wire: &WireValue) -> Result<bool, CodecError> {
        match wire {
            WireValue::Bool(value) => Ok(*value),
            other => Err(unexpected(WireKind::Bool, other)),
        }
    }

    fn default_value(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextInputCodec {
    pub max_chars: Option<usize>,
}

impl WidgetCodec for TextInputCodec {
    type Value = String;

    fn type_tag(&self) -> &str {
        "text_input"
    }

    fn serialize(&self, value: &String) -> WireValue {
        WireValue::String(value.clone())
    }

    fn deserialize(&self, wire: &WireValue) -> Result<String, CodecError> {
        let WireValue::String(text) = wire else {
            return Err(unexpected(WireKind::String, wire));
        };
        if let Some(max) = self.max_chars {
            let len = text.chars().count();
            if len > max {
                return Err(CodecError::TooLong { len, max });
            }
        }
        Ok(text.clone())
    }

    fn default_value(&self) -> String {
        String::new()
    }
}

// Integer wire values are widened.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberCodec;

impl WidgetCodec for NumberCodec {
    type Value = f64;

    fn type_tag(&self) -> &str {
        "number_input"
    }

    fn serialize(&self, value: &f64) -> WireValue {
        WireValue::Double(*value)
    }

    fn deserialize(&self, wire: &WireValue) -> Result<f64, CodecError> {
        let value = match wire {
            WireValue::Double(value) => *value,
            WireValue::Int(value) => *value as f64,
            other => return Err(unexpected(WireKind::Double, other)),
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(CodecError::NotFinite(value))
        }
    }

    fn default_value(&self) -> f64 {
        0.0
    }
}

/// Single choice among fixed options, sent as the option index. `None` is
/// "nothing selected", the only value of an empty option list.
#[derive(Debug, Clone)]
pub struct SelectCodec {
    options: Vec<String>,
}

impl SelectCodec {
    pub const ABSENT_INDEX: i64 = -1;

    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn index_of(&self, option: &str) -> Option<usize> {
        self.options.iter().position(|candidate| candidate == option)
    }
}

impl WidgetCodec for SelectCodec {
    type Value = Option<String>;

    fn type_tag(&self) -> &str {
        "selectbox"
    }

    // Values outside the option list serialize as nothing selected.
    fn serialize(&self, value: &Option<String>) -> WireValue {
        let index = value
            .as_deref()
            .and_then(|option| self.index_of(option))
            .map_or(Self::ABSENT_INDEX, |index| index as i64);
        WireValue::Int(index)
    }

    fn deserialize(&self, wire: &WireValue) -> Result<Option<String>, CodecError> {
        let WireValue::Int(index) = wire else {
            return Err(unexpected(WireKind::Int, wire));
        };
        if *index == Self::ABSENT_INDEX {
            return Ok(None);
        }
        usize::try_from(*index)
            .ok()
            .and_then(|i| self.options.get(i))
            .cloned()
            .map(Some)
            .ok_or(CodecError::OptionOutOfRange {
                index: *index,
                len: self.options.len(),
            })
    }

    fn default_value(&self) -> Option<String> {
        self.options.first().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn keypress_absent_sentinel_maps_to_none() {
        let codec = KeypressCodec;
        assert_eq!(codec.deserialize(&WireValue::String(String::new())), Ok(None));
        assert_eq!(
            codec.deserialize(&WireValue::String("Enter".to_string())),
            Ok(Some("Enter".to_string()))
        );
        assert_eq!(codec.serialize(&None), WireValue::String(String::new()));
    }

    #[test]
    fn trigger_rejects_other_kinds() {
        let err = TriggerCodec::new("button")
            .deserialize(&WireValue::String("yes".to_string()))
            .expect_err("string is not a trigger value");
        assert_eq!(
            err,
            CodecError::UnexpectedKind {
                expected: WireKind::Bool,
                found: WireKind::String,
            }
        );
    }

    #[test]
    fn text_input_enforces_max_chars() {
        let codec = TextInputCodec { max_chars: Some(3) };
        assert!(codec.deserialize(&WireValue::String("abc".to_string())).is_ok());
        assert_eq!(
            codec.deserialize(&WireValue::String("abcd".to_string())),
            Err(CodecError::TooLong { len: 4, max: 3 })
        );
    }

    #[test]
    fn number_accepts_int_and_rejects_nan() {
        assert_eq!(NumberCodec.deserialize(&WireValue::Int(4)), Ok(4.0));
        assert!(NumberCodec.deserialize(&WireValue::Double(f64::NAN)).is_err());
    }

    #[test]
    fn keypress_empty_key_normalizes_to_none() {
        let codec = KeypressCodec;
        let wire = codec.serialize(&Some(String::new()));
        assert_eq!(wire, WireValue::String(KeypressCodec::ABSENT.to_string()));
        assert_eq!(codec.deserialize(&wire), Ok(None));
    }

    #[test]
    fn select_rejects_out_of_range_index() {
        let codec = SelectCodec::new(["red", "green"]);
        assert_eq!(codec.deserialize(&WireValue::Int(1)), Ok(Some("green".to_string())));
        assert_eq!(
            codec.deserialize(&WireValue::Int(2)),
            Err(CodecError::OptionOutOfRange { index: 2, len: 2 })
        );
        assert!(codec.deserialize(&WireValue::Int(-2)).is_err());
        assert_eq!(codec.deserialize(&WireValue::Int(-1)), Ok(None));
        assert_eq!(codec.default_value(), Some("red".to_string()));
    }

    #[test]
    fn empty_select_defaults_to_nothing_selected() {
        let codec = SelectCodec::new(Vec::<String>::new());
        assert_eq!(codec.default_value(), None);
        let wire = codec.serialize(&codec.default_value());
        assert_eq!(wire, WireValue::Int(SelectCodec::ABSENT_INDEX));
        assert_eq!(codec.deserialize(&wire), Ok(None));
        assert_eq!(
            codec.deserialize(&WireValue::Int(0)),
            Err(CodecError::OptionOutOfRange { index: 0, len: 0 })
        );
    }

    proptest! {
        #[test]
        fn text_round_trips(text in ".*") {
            let codec = TextInputCodec::default();
            prop_assert_eq!(codec.deserialize(&codec.serialize(&text)), Ok(text));
        }

        #[test]
        fn number_round_trips(value in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            prop_assert_eq!(NumberCodec.deserialize(&NumberCodec.serialize(&value)), Ok(value));
        }

        #[test]
        fn keypress_round_trips(key in proptest::option::of(".{0,8}")) {
            let codec = KeypressCodec;
            let expected = key.clone().filter(|key| !key.is_empty());
            prop_assert_eq!(codec.deserialize(&codec.serialize(&key)), Ok(expected));
        }

        #[test]
        fn select_round_trips(index in 0usize..4) {
            let codec = SelectCodec::new(["a", "b", "c", "d"]);
            let option = Some(codec.options()[index].clone());
            prop_assert_eq!(codec.deserialize(&codec.serialize(&option)), Ok(option));
        }
    }
}
