//! NETCONF RPC body encoding
//!
//! Turns a [`NetconfAction`] into the XML placed inside `<rpc>`. The root
//! element is the operation name:
//!
//! - `get-config`: `<get-config><source><running/></source>[filter]</get-config>`
//! - `get`: `<get>[filter]</get>`
//! - `edit-config`: `<edit-config><target><running/></target><config>..</config></edit-config>`
//!
//! with `filter` rendered as `<filter type=".."><top xmlns="..">SELECT</top></filter>`.
//! Embedded fragments that are not well-formed XML are replaced by an empty
//! element and reported as [`EncodeWarning`]s instead of failing the action.

use crate::error::{AppError, Result};
use crate::suite::{Filter, NetconfAction};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Operations the encoder knows how to build
pub const SUPPORTED_OPERATIONS: &[&str] = &["get", "get-config", "edit-config"];

/// Encoded RPC body plus anything that was degraded while building it
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRpc {
    pub body: String,
    pub warnings: Vec<EncodeWarning>,
}

/// An embedded fragment that had to be dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeWarning {
    /// edit-config `config` was not well-formed
    InvalidConfig(String),
    /// filter `select` was not well-formed
    InvalidFilterSelect(String),
}

impl std::fmt::Display for EncodeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeWarning::InvalidConfig(reason) => write!(f, "Config data is not valid xml: {}", reason),
            EncodeWarning::InvalidFilterSelect(reason) => write!(f, "Filter Select is not valid xml: {}", reason),
        }
    }
}

/// Build the RPC body for an action
///
/// Unsupported operations fail before anything is written.
pub fn encode(action: &NetconfAction) -> Result<EncodedRpc> {
    let mut builder = RpcBuilder::new();

    match action.operation.as_str() {
        "get-config" => {
            builder.start(&action.operation)?;
            builder.datastore("source", action.source.as_deref())?;
            if let Some(filter) = &action.filter {
                builder.filter(filter)?;
            }
            builder.end(&action.operation)?;
        }
        "get" => {
            builder.start(&action.operation)?;
            if let Some(filter) = &action.filter {
                builder.filter(filter)?;
            }
            builder.end(&action.operation)?;
        }
        "edit-config" => {
            builder.start(&action.operation)?;
            builder.datastore("target", action.target.as_deref())?;
            builder.config(action.config.as_deref())?;
            builder.end(&action.operation)?;
        }
        other => return Err(AppError::unsupported_operation(other)),
    }

    builder.finish()
}

/// Check that a fragment is well-formed enough to embed as child content
pub fn check_fragment(fragment: &str) -> std::result::Result<(), String> {
    let mut reader = Reader::from_str(fragment);
    let mut depth: usize = 0;
    let mut elements: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                check_attributes(&start)?;
                depth += 1;
                elements += 1;
            }
            Ok(Event::End(end)) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(end.name().as_ref())
                    )
                })?;
            }
            Ok(Event::Empty(start)) => {
                check_attributes(&start)?;
                elements += 1;
            }
            Ok(Event::Text(text)) => {
                text.unescape()
                    .map_err(|e| format!("{} at position {}", e, reader.buffer_position()))?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!("{} at position {}", e, reader.buffer_position()));
            }
        }
    }

    if depth > 0 {
        return Err(format!("{} element(s) left open", depth));
    }
    if elements == 0 {
        return Err("no element found".to_string());
    }
    Ok(())
}

/// Attributes must parse and their values must only use known entities
fn check_attributes(start: &BytesStart<'_>) -> std::result::Result<(), String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| format!("bad attribute on <{}>: {}", name, e))?;
        attribute
            .unescape_value()
            .map_err(|e| format!("bad attribute on <{}>: {}", name, e))?;
    }
    Ok(())
}

/// Whether `name` can be used as an element name
///
/// ASCII subset of the XML name grammar: letters, digits, `_`,
/// `-`, `.` and `:`, not starting with a digit, `-`, `.` or `:`.
pub fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

struct RpcBuilder {
    writer: Writer<Vec<u8>>,
    warnings: Vec<EncodeWarning>,
}

impl RpcBuilder {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
            warnings: Vec::new(),
        }
    }

    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| AppError::encode(format!("failed to write rpc body: {}", e)))
    }

    fn start(&mut self, name: &str) -> Result<()> {
        self.emit(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.emit(Event::Empty(element))
    }

    fn raw(&mut self, fragment: &str) -> Result<()> {
        self.emit(Event::Text(BytesText::from_escaped(fragment)))
    }

    /// `<source><running/></source>` style wrapper
    fn datastore(&mut self, wrapper: &str, datastore: Option<&str>) -> Result<()> {
        let datastore = datastore
            .filter(|name| !name.is_empty())
            .unwrap_or(crate::defaults::DEFAULT_DATASTORE);
        if !is_element_name(datastore) {
            return Err(AppError::encode(format!("{} {:?} is not a valid datastore name", wrapper, datastore)));
        }
        self.start(wrapper)?;
        self.empty(BytesStart::new(datastore))?;
        self.end(wrapper)
    }

    fn filter(&mut self, filter: &Filter) -> Result<()> {
        let element = BytesStart::new("filter").with_attributes([("type", filter.filter_type.as_str())]);
        self.emit(Event::Start(element))?;

        let mut top = BytesStart::new("top");
        if let Some(ns) = &filter.ns {
            top.push_attribute(("xmlns", ns.as_str()));
        }

        let select = filter.select.trim();
        match check_fragment(select) {
            Ok(()) => {
                self.emit(Event::Start(top))?;
                self.raw(select)?;
                self.end("top")?;
            }
            Err(reason) => {
                self.warnings.push(EncodeWarning::InvalidFilterSelect(reason));
                self.empty(top)?;
            }
        }

        self.end("filter")
    }

    fn config(&mut self, config: Option<&str>) -> Result<()> {
        let fragment = match config.map(str::trim) {
            None => None,
            Some(fragment) => match check_fragment(fragment) {
                Ok(()) => Some(fragment),
                Err(reason) => {
                    self.warnings.push(EncodeWarning::InvalidConfig(reason));
                    None
                }
            },
        };

        match fragment {
            Some(fragment) => {
                self.start("config")?;
                self.raw(fragment)?;
                self.end("config")
            }
            None => self.empty(BytesStart::new("config")),
        }
    }

    fn finish(self) -> Result<EncodedRpc> {
        let body = String::from_utf8(self.writer.into_inner())
            .map_err(|e| AppError::encode(format!("rpc body is not utf-8: {}", e)))?;
        Ok(EncodedRpc {
            body,
            warnings: self.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(select: &str, ns: Option<&str>) -> Filter {
        Filter {
            filter_type: "subtree".to_string(),
            ns: ns.map(String::from),
            select: select.to_string(),
        }
    }

    #[test]
    fn test_get_config_defaults_to_running() {
        let rpc = encode(&NetconfAction::new("r1", "get-config")).unwrap();
        assert_eq!(rpc.body, "<get-config><source><running/></source></get-config>");
        assert!(rpc.warnings.is_empty());
    }

    #[test]
    fn test_get_config_with_source_and_filter() {
        let mut action = NetconfAction::new("r1", "get-config");
        action.source = Some("candidate".to_string());
        action.filter = Some(filter("<interfaces/>", Some("urn:ietf:params:xml:ns:yang:ietf-interfaces")));

        let rpc = encode(&action).unwrap();
        assert_eq!(
            rpc.body,
            "<get-config><source><candidate/></source>\
             <filter type=\"subtree\"><top xmlns=\"urn:ietf:params:xml:ns:yang:ietf-interfaces\"><interfaces/></top></filter>\
             </get-config>"
        );
    }

    #[test]
    fn test_get_without_filter() {
        let rpc = encode(&NetconfAction::new("r1", "get")).unwrap();
        assert_eq!(rpc.body, "<get></get>");
    }

    #[test]
    fn test_get_filter_without_namespace() {
        let mut action = NetconfAction::new("r1", "get");
        action.filter = Some(filter("<system><hostname/></system>", None));

        let rpc = encode(&action).unwrap();
        assert_eq!(
            rpc.body,
            "<get><filter type=\"subtree\"><top><system><hostname/></system></top></filter></get>"
        );
    }

    #[test]
    fn test_edit_config_with_target() {
        let mut action = NetconfAction::new("r1", "edit-config");
        action.target = Some("candidate".to_string());
        action.config = Some("<a>1</a>".to_string());

        let rpc = encode(&action).unwrap();
        assert_eq!(
            rpc.body,
            "<edit-config><target><candidate/></target><config><a>1</a></config></edit-config>"
        );
    }

    #[test]
    fn test_edit_config_defaults_to_running() {
        let mut action = NetconfAction::new("r1", "edit-config");
        action.config = Some("  <a>1</a>\n".to_string());

        let rpc = encode(&action).unwrap();
        assert_eq!(
            rpc.body,
            "<edit-config><target><running/></target><config><a>1</a></config></edit-config>"
        );
    }

    #[test]
    fn test_unsupported_operation() {
        let err = encode(&NetconfAction::new("r1", "commit")).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedOperation(ref op) if op == "commit"));
    }

    #[test]
    fn test_malformed_config_degrades() {
        let mut action = NetconfAction::new("r1", "edit-config");
        action.config = Some("<a>1</b>".to_string());

        let rpc = encode(&action).unwrap();
        assert_eq!(rpc.body, "<edit-config><target><running/></target><config/></edit-config>");
        assert!(matches!(rpc.warnings.as_slice(), [EncodeWarning::InvalidConfig(_)]));
    }

    #[test]
    fn test_malformed_select_degrades() {
        let mut action = NetconfAction::new("r1", "get");
        action.filter = Some(filter("<interfaces>", Some("urn:x")));

        let rpc = encode(&action).unwrap();
        assert_eq!(rpc.body, "<get><filter type=\"subtree\"><top xmlns=\"urn:x\"/></filter></get>");
        assert_eq!(rpc.warnings.len(), 1);
        assert!(rpc.warnings[0].to_string().starts_with("Filter Select is not valid xml"));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let mut action = NetconfAction::new("r1", "get");
        action.filter = Some(Filter {
            filter_type: "xpath".to_string(),
            ns: Some("urn:a&b".to_string()),
            select: "<x/>".to_string(),
        });

        let rpc = encode(&action).unwrap();
        assert!(rpc.body.contains("xmlns=\"urn:a&amp;b\""));
    }

    #[test]
    fn test_check_fragment() {
        assert!(check_fragment("<a>1</a>").is_ok());
        assert!(check_fragment("<a/><b/>").is_ok());
        assert!(check_fragment("<a><b></a>").is_err());
        assert!(check_fragment("<a>").is_err());
        assert!(check_fragment("just text").is_err());
        assert!(check_fragment("").is_err());
        assert!(check_fragment("<a>&amp;&lt;&#160;</a>").is_ok());
        assert!(check_fragment("<a>&nbsp;</a>").is_err());
        assert!(check_fragment("<a b=\"&bogus;\"/>").is_err());
        assert!(check_fragment("<a b=\"x &amp; y\">1</a>").is_ok());
    }

    #[test]
    fn test_undefined_entity_in_config_degrades() {
        let mut action = NetconfAction::new("r1", "edit-config");
        action.config = Some("<a>&nbsp;</a>".to_string());

        let rpc = encode(&action).unwrap();
        assert_eq!(rpc.body, "<edit-config><target><running/></target><config/></edit-config>");
        assert!(matches!(rpc.warnings.as_slice(), [EncodeWarning::InvalidConfig(_)]));
    }

    #[test]
    fn test_invalid_datastore_is_not_encoded() {
        let mut action = NetconfAction::new("r1", "get-config");
        action.source = Some("run ning".to_string());
        assert!(matches!(encode(&action), Err(AppError::Encode(_))));
    }

    #[test]
    fn test_element_names() {
        assert!(is_element_name("running"));
        assert!(is_element_name("candidate"));
        assert!(is_element_name("_x-1.y:z"));
        assert!(!is_element_name("run ning"));
        assert!(!is_element_name("1st"));
        assert!(!is_element_name("<a>"));
        assert!(!is_element_name(""));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn encoded_bodies_are_well_formed(
                datastore in "[a-z][a-z-]{0,12}",
                leaf in "[a-z]{1,8}",
                value in "[a-zA-Z0-9 ]{0,16}",
            ) {
                let mut action = NetconfAction::new("r1", "edit-config");
                action.target = Some(datastore);
                action.config = Some(format!("<{leaf}>{value}</{leaf}>"));

                let rpc = encode(&action).unwrap();
                prop_assert!(rpc.warnings.is_empty());
                prop_assert!(check_fragment(&rpc.body).is_ok());
                prop_assert!(rpc.body.starts_with("<edit-config>"));
            }

            #[test]
            fn unsupported_operations_never_encode(op in "[a-z-]{1,16}") {
                prop_assume!(!SUPPORTED_OPERATIONS.contains(&op.as_str()));
                prop_assert!(encode(&NetconfAction::new("r1", op)).is_err());
            }
        }
    }
}
