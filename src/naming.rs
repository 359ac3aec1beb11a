//! Identifier derivation shared by the type generator and the handler merge.
//!
//! The merge recomputes the identifiers the generator would produce, so every function here
//! must be a pure function of its input.

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be written as raw identifiers.
const NON_RAW: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Names generated type declarations must not shadow.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "Box", "BTreeMap", "DateTime", "Deserialize", "Err", "HandlerError", "Map", "None", "Ok",
    "Omittable", "Option", "RequestContext", "Result", "Serialize", "Some", "String", "Utc",
    "Value", "Vec",
];

/// Split on `_`, `-` and space, upper-case the first character of each segment, concatenate.
///
/// The rest of each segment is kept as written, so `getHTTP_data` becomes `GetHTTPData`.
pub fn to_pascal_case(s: &str) -> String {
    s.split(['_', '-', ' '])
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// `snake_case` with word boundaries at separators, lower-to-upper transitions and the end of
/// an acronym (`HTTPServer` → `http_server`, `userID` → `user_id`).
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|j| chars[j]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Escape a Rust keyword so it can be used as an identifier.
pub fn escape_keyword(ident: &str) -> String {
    if NON_RAW.contains(&ident) {
        format!("{ident}_")
    } else if KEYWORDS.contains(&ident) {
        format!("r#{ident}")
    } else {
        ident.to_string()
    }
}

fn keep_ident_chars(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// Type name for a schema name.
///
/// Strips a `.json`/`.yaml`/`.yml` extension and a `_schema`/`-schema` suffix, then applies
/// [`to_pascal_case`] with `.` as an additional separator. Names that would shadow a type
/// generated code relies on (`String`, `Result`...) get a `Type` suffix.
pub fn to_type_name(name: &str) -> String {
    let mut base = name;
    for ext in [".json", ".yaml", ".yml"] {
        if let Some(stripped) = base.strip_suffix(ext) {
            base = stripped;
            break;
        }
    }
    for suffix in ["_schema", "-schema"] {
        if let Some(stripped) = base.strip_suffix(suffix) {
            if !stripped.is_empty() {
                base = stripped;
            }
            break;
        }
    }
    let pascal = keep_ident_chars(&to_pascal_case(&base.replace('.', "_")));
    let ident = match pascal.chars().next() {
        None => "Anonymous".to_string(),
        Some(c) if c.is_ascii_digit() => format!("Type{pascal}"),
        Some(_) if RESERVED_TYPE_NAMES.contains(&pascal.as_str()) => format!("{pascal}Type"),
        Some(_) => pascal,
    };
    escape_keyword(&ident)
}

/// Record field name for a property name.
pub fn field_name(property: &str) -> String {
    let snake = to_snake_case(property);
    let ident = match snake.chars().next() {
        None => "field".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{snake}"),
        Some(_) => snake,
    };
    escape_keyword(&ident)
}

/// Handler method name for an operation name.
///
/// `snake_case` of the [`to_pascal_case`] identifier, so `get-weather`, `get_weather` and
/// `Get Weather` all map to `get_weather`.
pub fn handler_method_name(operation: &str) -> String {
    field_name(&to_pascal_case(operation))
}

/// Enum variant name for a wire value (`in_progress` → `InProgress`).
pub fn variant_name(value: &str) -> String {
    let normalized: String = value
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let pascal = keep_ident_chars(&to_pascal_case(&normalized));
    let ident = match pascal.chars().next() {
        None => "Empty".to_string(),
        Some(c) if c.is_ascii_digit() => format!("V{pascal}"),
        Some(_) => pascal,
    };
    escape_keyword(&ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("get_weather"), "GetWeather");
        assert_eq!(to_pascal_case("get-weather"), "GetWeather");
        assert_eq!(to_pascal_case("get weather"), "GetWeather");
        assert_eq!(to_pascal_case("getHTTP_data"), "GetHTTPData");
        assert_eq!(to_pascal_case("__double__"), "Double");
        assert_eq!(to_pascal_case(""), "");
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("userID"), "user_id");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("GetWeather"), "get_weather");
        assert_eq!(to_snake_case("first-name"), "first_name");
        assert_eq!(to_snake_case("v2Name"), "v2_name");
        assert_eq!(to_snake_case("$ref"), "ref");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_to_type_name() {
        assert_eq!(to_type_name("user"), "User");
        assert_eq!(to_type_name("task_status"), "TaskStatus");
        assert_eq!(to_type_name("task_input_schema"), "TaskInput");
        assert_eq!(to_type_name("user.json"), "User");
        assert_eq!(to_type_name("api.v1.user"), "ApiV1User");
        assert_eq!(to_type_name("3d-point"), "Type3dPoint");
        assert_eq!(to_type_name("_schema"), "Schema");
        assert_eq!(to_type_name(""), "Anonymous");
        assert_eq!(to_type_name("self"), "Self_");
        assert_eq!(to_type_name("string"), "StringType");
        assert_eq!(to_type_name("result"), "ResultType");
    }

    #[test]
    fn test_field_name_escapes() {
        assert_eq!(field_name("id"), "id");
        assert_eq!(field_name("type"), "r#type");
        assert_eq!(field_name("self"), "self_");
        assert_eq!(field_name("2fa"), "_2fa");
        assert_eq!(field_name("@@"), "field");
        assert_eq!(field_name("createdAt"), "created_at");
    }

    #[test]
    fn test_handler_method_name_is_separator_insensitive() {
        assert_eq!(handler_method_name("get-weather"), "get_weather");
        assert_eq!(handler_method_name("get_weather"), "get_weather");
        assert_eq!(handler_method_name("get weather"), "get_weather");
        assert_eq!(handler_method_name("listFiles"), "list_files");
        assert_eq!(handler_method_name("move"), "r#move");
    }

    #[test]
    fn test_variant_name() {
        assert_eq!(variant_name("in_progress"), "InProgress");
        assert_eq!(variant_name("done"), "Done");
        assert_eq!(variant_name("in-review"), "InReview");
        assert_eq!(variant_name("a.b"), "AB");
        assert_eq!(variant_name("404"), "V404");
        assert_eq!(variant_name(""), "Empty");
        assert_eq!(variant_name("Self"), "Self_");
    }
}
