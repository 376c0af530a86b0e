//! Minimal XML writer for metadata files
//!
//! Metadata files are flat, element-only documents, so a small indenting
//! writer covers everything the renderers need. All text content goes
//! through [`escape`].

use std::fmt::Display;

/// XML declaration written at the top of every file
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Namespace of the metadata API
pub const METADATA_NAMESPACE: &str = "http://soap.sforce.com/2006/04/metadata";

const INDENT: &str = "    ";

/// Escape the five XML special characters
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Indenting writer for one metadata document
#[derive(Debug)]
pub struct XmlWriter {
    out: String,
    stack: Vec<&'static str>,
}

impl XmlWriter {
    /// Start a document with the given root element in the metadata namespace
    pub fn new(root: &'static str) -> Self {
        let mut out = String::with_capacity(1024);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        out.push_str(&format!("<{} xmlns=\"{}\">\n", root, METADATA_NAMESPACE));

        Self {
            out,
            stack: vec![root],
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.stack.len() {
            self.out.push_str(INDENT);
        }
    }

    /// Open a nested element
    pub fn open(&mut self, tag: &'static str) -> &mut Self {
        self.indent();
        self.out.push_str(&format!("<{}>\n", tag));
        self.stack.push(tag);
        self
    }

    /// Close the innermost open element
    pub fn close(&mut self) -> &mut Self {
        if self.stack.len() > 1 {
            if let Some(tag) = self.stack.pop() {
                self.indent();
                self.out.push_str(&format!("</{}>\n", tag));
            }
        }
        self
    }

    /// Write a text element; the value is escaped
    pub fn element(&mut self, tag: &str, value: impl Display) -> &mut Self {
        self.indent();
        self.out
            .push_str(&format!("<{tag}>{}</{tag}>\n", escape(&value.to_string())));
        self
    }

    /// Write a text element only when a value is present
    pub fn optional<T: Display>(&mut self, tag: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.element(tag, value);
        }
        self
    }

    /// Close every open element and return the document
    pub fn finish(mut self) -> String {
        while self.stack.len() > 1 {
            self.close();
        }
        if let Some(root) = self.stack.pop() {
            self.out.push_str(&format!("</{}>\n", root));
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"Price < 0 && Name <> "x's""#),
            "Price &lt; 0 &amp;&amp; Name &lt;&gt; &quot;x&apos;s&quot;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_writer_nesting() {
        let mut xml = XmlWriter::new("Profile");
        xml.open("fieldPermissions")
            .element("editable", false)
            .element("field", "Car__c.Price__c")
            .close();
        xml.optional("description", None::<&str>);

        assert_eq!(
            xml.finish(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <Profile xmlns=\"http://soap.sforce.com/2006/04/metadata\">\n\
             \x20   <fieldPermissions>\n\
             \x20       <editable>false</editable>\n\
             \x20       <field>Car__c.Price__c</field>\n\
             \x20   </fieldPermissions>\n\
             </Profile>\n"
        );
    }

    #[test]
    fn test_finish_closes_open_elements() {
        let mut xml = XmlWriter::new("Package");
        xml.open("types").element("name", "CustomObject");
        let doc = xml.finish();
        assert!(doc.ends_with("    </types>\n</Package>\n"));
    }
}
