//! Streaming rewrite of custom document properties.
//!
//! Custom properties live in the `docProps/custom.xml` part of an Office
//! package:
//!
//! ```xml
//! <Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/custom-properties"
//!             xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
//!   <property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="2" name="Greeting">
//!     <vt:lpwstr>Hello {{ FirstName }}</vt:lpwstr>
//!   </property>
//! </Properties>
//! ```
//!
//! [`PropertyTransformer`] copies such a part event by event. Text found
//! inside a `<property>` element is handed to a rewrite callback and replaced
//! with its result; everything else (tags and their attributes, comments,
//! processing instructions, text outside properties) is written back exactly
//! as it was read. There is no tree: the part is processed as a stream.
//!
//! A leading UTF-8 byte order mark is kept. Line breaks inside rendered
//! property text are normalized the way an XML parser reads them, and a
//! carriage return in the result is written as `&#13;`.

mod region;

use crate::config::PROPERTY_ELEMENT;
use crate::error::{DocumentError, Result};
use quick_xml::escape::{escape, resolve_predefined_entity, unescape};
use quick_xml::events::{BytesRef, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use region::PropertyRegion;
use std::borrow::Cow;
use std::io::{BufRead, Write};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A run of property text passed to the rewrite callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyText<'a> {
    /// `name` attribute of the innermost enclosing property, if present
    pub name: Option<&'a str>,
    /// Unescaped text content
    pub text: &'a str,
}

/// Counts collected while transforming a part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSummary {
    /// Property elements seen
    pub properties: usize,
    /// Text runs handed to the rewrite callback
    pub rendered_runs: usize,
}

/// Copies an XML part, rewriting the text inside property elements.
///
/// Consecutive text, entity references and CDATA sections inside a property
/// are joined into one logical run before the callback sees them, so a value
/// such as `Tom &amp; {{ Name }}` arrives as `Tom & {{ Name }}`. The result
/// is escaped again when written. Runs consisting only of whitespace are
/// written back without calling the callback.
///
/// Property elements may nest; text belongs to the innermost one.
///
/// # Example
///
/// ```rust
/// use docstamp::props::PropertyTransformer;
///
/// let input = br#"<Properties><property name="A"><vt:lpwstr>hello</vt:lpwstr></property></Properties>"#;
/// let mut output = Vec::new();
/// PropertyTransformer::new("docProps/custom.xml")
///     .transform(&input[..], &mut output, |p| Ok(p.text.to_uppercase()))?;
///
/// assert_eq!(
///     output,
///     br#"<Properties><property name="A"><vt:lpwstr>HELLO</vt:lpwstr></property></Properties>"#
/// );
/// # Ok::<(), docstamp::DocumentError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PropertyTransformer<'a> {
    entry: &'a str,
    element: &'a str,
}

impl<'a> PropertyTransformer<'a> {
    /// Create a transformer for the archive entry `entry`.
    ///
    /// The entry name is only used in error messages.
    pub fn new(entry: &'a str) -> Self {
        Self {
            entry,
            element: PROPERTY_ELEMENT,
        }
    }

    /// Use a different local name for the property element.
    pub fn with_element(mut self, element: &'a str) -> Self {
        self.element = element;
        self
    }

    /// Stream `input` to `output`, passing property text through `rewrite`.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::XmlDecode`] if the input is not well-formed,
    ///   including input that ends before every element is closed
    /// - [`DocumentError::EntryRead`] if reading the input fails
    /// - [`DocumentError::ArchiveWrite`] if writing the output fails
    /// - any error returned by `rewrite`
    pub fn transform<R, W, F>(
        &self,
        mut input: R,
        mut output: W,
        rewrite: F,
    ) -> Result<TransformSummary>
    where
        R: BufRead,
        W: Write,
        F: FnMut(PropertyText<'_>) -> Result<String>,
    {
        // quick-xml drops the BOM, so carry it over by hand
        let head = input
            .fill_buf()
            .map_err(|e| DocumentError::entry_read(self.entry, e))?;
        if head.starts_with(UTF8_BOM) {
            input.consume(UTF8_BOM.len());
            output.write_all(UTF8_BOM).map_err(DocumentError::write)?;
        }

        let mut reader = Reader::from_reader(input);
        let mut emitter = Emitter {
            writer: Writer::new(output),
            region: PropertyRegion::default(),
            pending: String::new(),
            verbatim: Some(String::new()),
            rewrite,
            summary: TransformSummary::default(),
        };
        let mut open = Vec::new();

        let mut buf = Vec::new();
        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| self.read_error(&reader, e))?;

            match event {
                Event::Eof => break,
                Event::Text(text) if emitter.region.is_open() => {
                    let content = text
                        .xml10_content()
                        .map_err(|e| self.decode_error(&reader, e))?;
                    let unescaped =
                        unescape(&content).map_err(|e| self.decode_error(&reader, e))?;
                    emitter.pending.push_str(&unescaped);
                    if let Some(verbatim) = emitter.verbatim.as_mut() {
                        verbatim.push_str(self.utf8(text.as_ref(), &reader)?);
                    }
                },
                Event::GeneralRef(reference) if emitter.region.is_open() => {
                    self.resolve_reference(&reference, &reader, &mut emitter.pending)?;
                    emitter.verbatim = None;
                },
                Event::CData(data) if emitter.region.is_open() => {
                    let content = data
                        .xml10_content()
                        .map_err(|e| self.decode_error(&reader, e))?;
                    emitter.pending.push_str(&content);
                    emitter.verbatim = None;
                },
                Event::Start(start) => {
                    emitter.flush()?;
                    let is_property = start.local_name().as_ref() == self.element.as_bytes();
                    let name = if is_property {
                        property_name(&start)
                    } else {
                        None
                    };
                    open.push(start.name().as_ref().to_vec());
                    emitter.write(Event::Start(start))?;
                    if is_property {
                        emitter.region.enter(name);
                        emitter.summary.properties += 1;
                    }
                },
                Event::End(end) => {
                    emitter.flush()?;
                    let is_property = end.local_name().as_ref() == self.element.as_bytes();
                    open.pop();
                    emitter.write(Event::End(end))?;
                    if is_property {
                        emitter.region.leave();
                    }
                },
                other => {
                    emitter.flush()?;
                    emitter.write(other)?;
                },
            }
            buf.clear();
        }

        if let Some(name) = open.last() {
            log::debug!(
                "{}: input ended with {} element(s) open, {} of them properties",
                self.entry,
                open.len(),
                emitter.region.depth()
            );
            return Err(DocumentError::XmlDecode {
                entry: self.entry.to_string(),
                position: reader.buffer_position(),
                message: format!(
                    "unexpected end of input inside <{}>",
                    String::from_utf8_lossy(name)
                ),
            });
        }
        emitter.finish()
    }

    /// Append the text an entity or character reference stands for.
    fn resolve_reference<R>(
        &self,
        reference: &BytesRef<'_>,
        reader: &Reader<R>,
        pending: &mut String,
    ) -> Result<()> {
        if let Some(ch) = reference
            .resolve_char_ref()
            .map_err(|e| self.decode_error(reader, e))?
        {
            pending.push(ch);
            return Ok(());
        }
        let name = self.utf8(reference.as_ref(), reader)?;
        match resolve_predefined_entity(name) {
            Some(resolved) => {
                pending.push_str(resolved);
                Ok(())
            },
            None => Err(self.decode_error(reader, format!("unknown entity `&{};`", name))),
        }
    }

    fn utf8<'b, R>(&self, bytes: &'b [u8], reader: &Reader<R>) -> Result<&'b str> {
        std::str::from_utf8(bytes).map_err(|e| self.decode_error(reader, e))
    }

    fn read_error<R>(&self, reader: &Reader<R>, err: quick_xml::Error) -> DocumentError {
        match err {
            quick_xml::Error::Io(io) => DocumentError::entry_read(self.entry, io),
            other => DocumentError::XmlDecode {
                entry: self.entry.to_string(),
                position: reader.error_position(),
                message: other.to_string(),
            },
        }
    }

    fn decode_error<R>(&self, reader: &Reader<R>, err: impl std::fmt::Display) -> DocumentError {
        DocumentError::XmlDecode {
            entry: self.entry.to_string(),
            position: reader.buffer_position(),
            message: err.to_string(),
        }
    }
}

/// Escape rendered text for a text node.
///
/// A raw carriage return would be read back as a line feed, so it is
/// written as a character reference.
fn escape_text(text: &str) -> Cow<'_, str> {
    let escaped = escape(text);
    if escaped.contains('\r') {
        Cow::Owned(escaped.replace('\r', "&#13;"))
    } else {
        escaped
    }
}

/// Value of the `name` attribute of a property start tag.
fn property_name(start: &BytesStart<'_>) -> Option<String> {
    let attr = start
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"name")?;
    let raw = std::str::from_utf8(&attr.value).ok()?;
    unescape(raw).ok().map(Cow::into_owned)
}

struct Emitter<W: Write, F> {
    writer: Writer<W>,
    region: PropertyRegion,
    pending: String,
    /// Source text of the pending run while it holds nothing but plain text
    verbatim: Option<String>,
    rewrite: F,
    summary: TransformSummary,
}

impl<W, F> Emitter<W, F>
where
    W: Write,
    F: FnMut(PropertyText<'_>) -> Result<String>,
{
    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(DocumentError::write)
    }

    /// Write out the pending property text, rewritten.
    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let source = std::mem::take(&mut self.pending);
        let verbatim = self.verbatim.replace(String::new());
        if source.trim().is_empty() {
            if let Some(verbatim) = verbatim {
                return self.write(Event::Text(BytesText::from_escaped(verbatim)));
            }
            return self.write(Event::Text(BytesText::from_escaped(escape_text(&source))));
        }

        self.summary.rendered_runs += 1;
        let text = (self.rewrite)(PropertyText {
            name: self.region.current_name(),
            text: &source,
        })?;
        self.write(Event::Text(BytesText::from_escaped(escape_text(&text))))
    }

    fn finish(mut self) -> Result<TransformSummary> {
        self.flush()?;
        let summary = self.summary;
        self.writer
            .into_inner()
            .flush()
            .map_err(DocumentError::write)?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOM_XML: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/custom-properties" "#,
        r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
        "<!-- generated for {{Name}} -->",
        r#"<property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="2" name="Greeting">"#,
        "<vt:lpwstr>Hello {{Name}}</vt:lpwstr></property>",
        r#"<property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="3" name="Label">"#,
        "<vt:lpwstr>Static</vt:lpwstr></property>",
        "</Properties>"
    );

    fn run<F>(input: &str, rewrite: F) -> Result<(String, TransformSummary)>
    where
        F: FnMut(PropertyText<'_>) -> Result<String>,
    {
        let mut output = Vec::new();
        let summary = PropertyTransformer::new("docProps/custom.xml").transform(
            input.as_bytes(),
            &mut output,
            rewrite,
        )?;
        Ok((String::from_utf8(output).unwrap(), summary))
    }

    fn substitute(p: PropertyText<'_>) -> Result<String> {
        Ok(p.text.replace("{{Name}}", "Alice"))
    }

    #[test]
    fn test_rewrites_only_property_text() {
        let (output, summary) = run(CUSTOM_XML, substitute).unwrap();

        assert_eq!(output, CUSTOM_XML.replace("Hello {{Name}}", "Hello Alice"));
        assert!(output.contains("<!-- generated for {{Name}} -->"));
        assert_eq!(summary.properties, 2);
        assert_eq!(summary.rendered_runs, 2);
    }

    #[test]
    fn test_untouched_markup_is_copied_verbatim() {
        let input = concat!(
            "<?xml version='1.0'?>\n",
            "<!DOCTYPE Properties>\n",
            "<?app keep this?>",
            "<Properties a='1'  b=\"two\">",
            "<meta>Tom &amp; Jerry &#169;</meta>",
            "<![CDATA[<raw>]]>",
            "<empty attr=\"x\"/>",
            "<!--note-->",
            "</Properties>\n"
        );
        let (output, summary) = run(input, |_| panic!("no property text expected")).unwrap();

        assert_eq!(output, input);
        assert_eq!(summary, TransformSummary::default());
    }

    #[test]
    fn test_joins_entities_and_cdata_into_one_run() {
        let input = r#"<p><property name="Pair"><v>Tom &amp; {{Name}}<![CDATA[!]]>&#33;</v></property></p>"#;
        let mut seen = Vec::new();
        let (output, _) = run(input, |p| {
            seen.push((p.name.map(str::to_string), p.text.to_string()));
            substitute(p)
        })
        .unwrap();

        assert_eq!(
            seen,
            [(Some("Pair".to_string()), "Tom & {{Name}}!!".to_string())]
        );
        assert_eq!(
            output,
            r#"<p><property name="Pair"><v>Tom &amp; Alice!!</v></property></p>"#
        );
    }

    #[test]
    fn test_rendered_markup_is_escaped() {
        let input = r#"<p><property name="X"><v>{{Name}}</v></property></p>"#;
        let (output, _) = run(input, |_| Ok("<script>&</script>".to_string())).unwrap();

        assert_eq!(
            output,
            r#"<p><property name="X"><v>&lt;script&gt;&amp;&lt;/script&gt;</v></property></p>"#
        );
    }

    #[test]
    fn test_whitespace_runs_skip_callback() {
        let input = "<p><property name=\"W\">\n  <v>x</v>\n</property></p>";
        let mut calls = 0;
        let (output, summary) = run(input, |p| {
            calls += 1;
            Ok(p.text.to_string())
        })
        .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(summary.rendered_runs, 1);
        assert_eq!(output, input);
    }

    #[test]
    fn test_nested_properties_track_depth() {
        let input = concat!(
            r#"<p><property name="outer">A"#,
            r#"<property name="inner">B</property>"#,
            "C</property>D</p>"
        );
        let mut seen = Vec::new();
        let (output, summary) = run(input, |p| {
            seen.push(format!("{}={}", p.name.unwrap_or("-"), p.text));
            Ok(p.text.to_lowercase())
        })
        .unwrap();

        assert_eq!(seen, ["outer=A", "inner=B", "outer=C"]);
        assert_eq!(
            output,
            concat!(
                r#"<p><property name="outer">a"#,
                r#"<property name="inner">b</property>"#,
                "c</property>D</p>"
            )
        );
        assert_eq!(summary.properties, 2);
    }

    #[test]
    fn test_prefixed_and_custom_elements() {
        let input = r#"<r><cp:property name="N">x</cp:property><meta:user-defined meta:name="U">y</meta:user-defined></r>"#;

        let (output, _) = run(input, |p| Ok(p.text.to_uppercase())).unwrap();
        assert!(output.contains("<cp:property name=\"N\">X</cp:property>"));
        assert!(output.contains(">y</meta:user-defined>"));

        let mut output = Vec::new();
        PropertyTransformer::new("meta.xml")
            .with_element("user-defined")
            .transform(input.as_bytes(), &mut output, |p| {
                assert_eq!(p.name, Some("U"));
                Ok(p.text.to_uppercase())
            })
            .unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains(">x</cp:property>"));
        assert!(output.contains(">Y</meta:user-defined>"));
    }

    #[test]
    fn test_self_closing_property_does_not_open_region() {
        let input = r#"<p><property name="E"/>text</p>"#;
        let (output, summary) = run(input, |_| panic!("no property text expected")).unwrap();
        assert_eq!(output, input);
        assert_eq!(summary.properties, 0);
    }

    #[test]
    fn test_mismatched_end_tag_is_fatal() {
        let input = r#"<Properties><property name="A"><vt:lpwstr>x</vt:bstr></property></Properties>"#;
        let err = run(input, substitute).unwrap_err();
        match err {
            DocumentError::XmlDecode { entry, .. } => assert_eq!(entry, "docProps/custom.xml"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_entity_in_property_is_fatal() {
        let input = r#"<p><property name="A">&bogus;</property></p>"#;
        let err = run(input, substitute).unwrap_err();
        assert!(matches!(err, DocumentError::XmlDecode { .. }));
    }

    #[test]
    fn test_truncated_input_is_fatal() {
        let cases = [
            (r#"<Properties><property name="A"><vt:lpwstr>hi"#, "<vt:lpwstr>"),
            (r#"<Properties><property name="A"><vt:lpwstr>hi</vt:lpwstr>"#, "<property>"),
            (r#"<Properties><property name="A"/>"#, "<Properties>"),
        ];
        for (input, innermost) in cases {
            match run(input, substitute).unwrap_err() {
                DocumentError::XmlDecode { message, .. } => {
                    assert!(message.contains(innermost), "{input}: {message}")
                },
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_carriage_return_survives_rendering() {
        let input = r#"<p><property name="A">a&#13;b</property></p>"#;
        let mut seen = String::new();
        let (output, _) = run(input, |p| {
            seen = p.text.to_string();
            Ok(p.text.to_uppercase())
        })
        .unwrap();

        assert_eq!(seen, "a\rb");
        assert_eq!(output, r#"<p><property name="A">A&#13;B</property></p>"#);
    }

    #[test]
    fn test_literal_line_breaks_are_normalized() {
        let input = "<p><property name=\"A\">one\r\ntwo\rthree</property></p>";
        let mut seen = String::new();
        let (output, _) = run(input, |p| {
            seen = p.text.to_string();
            Ok(p.text.to_string())
        })
        .unwrap();

        assert_eq!(seen, "one\ntwo\nthree");
        assert_eq!(output, "<p><property name=\"A\">one\ntwo\nthree</property></p>");
    }

    #[test]
    fn test_whitespace_runs_keep_their_bytes() {
        let input = "<p><property name=\"W\">\r\n  <v>x</v>\r\n</property></p>";
        let (output, _) = run(input, |p| Ok(p.text.to_string())).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_byte_order_mark_is_kept() {
        let input = "\u{FEFF}<?xml version=\"1.0\"?><P><property name=\"A\">x</property></P>";
        let (output, _) = run(input, |p| Ok(p.text.to_uppercase())).unwrap();
        assert_eq!(
            output,
            "\u{FEFF}<?xml version=\"1.0\"?><P><property name=\"A\">X</property></P>"
        );
    }

    #[test]
    fn test_callback_error_aborts() {
        let err = run(CUSTOM_XML, |_| Err(DocumentError::write("stop"))).unwrap_err();
        assert!(matches!(err, DocumentError::ArchiveWrite(_)));
    }
}
