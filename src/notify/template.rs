/// Replaces every `{{key}}` placeholder whose key `lookup` resolves.
///
/// Single left-to-right pass: substituted values are never scanned again, so
/// a value that itself contains `{{...}}` comes out unchanged. Text that does
/// not form a known placeholder is copied through and scanning resumes one
/// brace later, so `{{{name}}}` still yields `{` + value + `}`.
pub fn render<'a, F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            // unterminated, nothing more to substitute
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after_open[..end];
        if !key.contains('{') {
            if let Some(value) = lookup(key) {
                out.push_str(value);
                rest = &after_open[end + 2..];
                continue;
            }
        }
        out.push('{');
        rest = &rest[start + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fields(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn replaces_every_occurrence() {
        let f = fields(&[("name", "John")]);
        let out = render("Hi {{name}}, bye {{name}}", |k| f.get(k).copied());
        assert_eq!(out, "Hi John, bye John");
    }

    #[test]
    fn unknown_placeholders_stay_verbatim() {
        let f = fields(&[("name", "John")]);
        let out = render("{{greeting}} {{name}}", |k| f.get(k).copied());
        assert_eq!(out, "{{greeting}} John");
    }

    #[test]
    fn extra_fields_do_not_change_output() {
        let tpl = "<p>Hello {{name}}</p>";
        let base = fields(&[("name", "Jane")]);
        let extra = fields(&[("name", "Jane"), ("token", "abc"), ("x", "y")]);
        assert_eq!(
            render(tpl, |k| base.get(k).copied()),
            render(tpl, |k| extra.get(k).copied())
        );
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let f = fields(&[("name", "{{email}}"), ("email", "a@b.c")]);
        let out = render("{{name}} / {{email}}", |k| f.get(k).copied());
        assert_eq!(out, "{{email}} / a@b.c");
    }

    #[test]
    fn unterminated_placeholder_is_left_alone() {
        let f = fields(&[("name", "John")]);
        assert_eq!(render("Hi {{name", |k| f.get(k).copied()), "Hi {{name");
        assert_eq!(render("{{name}} {{", |k| f.get(k).copied()), "John {{");
    }

    #[test]
    fn keys_are_matched_literally() {
        let f = fields(&[("a.b", "dot")]);
        assert_eq!(render("{{a.b}} {{aXb}}", |k| f.get(k).copied()), "dot {{aXb}}");
    }

    #[test]
    fn extra_opening_braces_do_not_hide_placeholders() {
        let f = fields(&[("name", "John")]);
        assert_eq!(render("{{{name}}}", |k| f.get(k).copied()), "{John}");
        assert_eq!(render("a {{ b {{name}}", |k| f.get(k).copied()), "a {{ b John");
        assert_eq!(render("{{nope}}{{name}}", |k| f.get(k).copied()), "{{nope}}John");
    }
}
