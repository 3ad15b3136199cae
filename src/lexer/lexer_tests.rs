use super::*;

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

fn values(tokens: &[Token]) -> Vec<&str> {
    tokens.iter().map(|t| t.value.as_str()).collect()
}

#[test]
fn test_basic_function() {
    let input = "int main(void) {}";
    let tokens = lex(input);
    assert_eq!(
        values(&tokens),
        vec!["int", "main", "(", "void", ")", "{", "}"]
    );
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Type,
            TokenKind::Identifier,
            TokenKind::Punctuation,
            TokenKind::Type,
            TokenKind::Punctuation,
            TokenKind::Punctuation,
            TokenKind::Punctuation,
        ]
    );
}

#[test]
fn test_offsets_reconstruct_source() {
    let input = "int x = 42; /* note */ return x;";
    for token in lex(input) {
        assert_eq!(&input[token.start..token.end], token.value);
    }
}

#[test]
fn test_determinism() {
    let input = "int main() { return 1 + 2; }";
    assert_eq!(lex(input), lex(input));
}

#[test]
fn test_multichar_operators() {
    let tokens = lex("a == b != c <= d >= e && f || g << h >> i ++ --");
    let ops: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Operator)
        .map(|t| t.value.as_str())
        .collect();
    assert_eq!(
        ops,
        vec!["==", "!=", "<=", ">=", "&&", "||", "<<", ">>", "++", "--"]
    );
}

#[test]
fn test_keyword_type_qualifier_classes() {
    let tokens = lex("const unsigned int x; if (x) return;");
    assert_eq!(tokens[0].kind, TokenKind::Qualifier);
    assert_eq!(tokens[1].kind, TokenKind::Type);
    assert_eq!(tokens[2].kind, TokenKind::Type);
    assert_eq!(tokens[3].kind, TokenKind::Identifier);
    assert!(tokens.iter().any(|t| t.is_keyword("if")));
    assert!(tokens.iter().any(|t| t.is_keyword("return")));
}

#[test]
fn test_string_and_char_literals() {
    let tokens = lex(r#"printf("hi\n"); char c = 'a';"#);
    let string = tokens.iter().find(|t| t.kind == TokenKind::String).unwrap();
    assert_eq!(string.value, r#""hi\n""#);
    let ch = tokens.iter().find(|t| t.kind == TokenKind::Char).unwrap();
    assert_eq!(ch.value, "'a'");
}

#[test]
fn test_unterminated_string_is_error_token() {
    let tokens = lex("char *s = \"oops;\nint x;");
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
    // Scanning continues on the next line.
    assert!(tokens.iter().any(|t| t.value == "x"));
}

#[test]
fn test_unrecognized_character() {
    let tokens = lex("int a = 1 @ 2;");
    let error = tokens.iter().find(|t| t.kind == TokenKind::Error).unwrap();
    assert_eq!(error.value, "@");
    // One byte consumed, the rest still tokenized.
    assert!(tokens.iter().any(|t| t.value == "2"));
}

#[test]
fn test_comments_preserved() {
    let tokens = lex("// line\nint x; /* block */ int y;");
    let comments: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Comment)
        .map(|t| t.value.as_str())
        .collect();
    assert_eq!(comments, vec!["// line", "/* block */"]);
}

#[test]
fn test_preprocessor_line() {
    let tokens = lex("#include <stdio.h>\nint main() {}");
    assert_eq!(tokens[0].kind, TokenKind::Preprocessor);
    assert_eq!(tokens[0].value, "#include <stdio.h>");
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].value, "int");
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn test_number_literals() {
    let tokens = lex("x = 10 + 3.25;");
    let numbers: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Number)
        .map(|t| t.value.as_str())
        .collect();
    assert_eq!(numbers, vec!["10", "3.25"]);
}

#[test]
fn test_line_and_column() {
    let tokens = lex("int a;\n  int b;");
    let b = tokens.iter().find(|t| t.value == "b").unwrap();
    assert_eq!(b.line, 2);
    assert_eq!(b.column, 7);
}
