// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! End-to-end preprocessor scenarios exercised through the library API.

use lineforge::core::error::PreprocessErrorKind;
use lineforge::core::preprocess::{Preprocessor, UnknownDirectivePolicy};
use lineforge::core::symbol_table::DefineValue;

#[test]
fn build_variant_generation() {
    // One template, two build variants selected by defines.
    let template = "\
header\n\
#if PLATFORM == 1\n\
platform: embedded\n\
#elif PLATFORM == 2\n\
platform: desktop\n\
#else\n\
platform: unknown\n\
#endif\n\
#if DEBUG && PLATFORM != 1\n\
debug helpers enabled\n\
#endif\n\
footer\n";

    let mut embedded = Preprocessor::new();
    embedded.define("PLATFORM", DefineValue::Number(1));
    embedded.define("DEBUG", DefineValue::Number(1));
    let outputs = embedded.parse(template).unwrap();
    assert_eq!(outputs[0], "header\nplatform: embedded\nfooter\n");

    let mut desktop = Preprocessor::new();
    desktop.define("PLATFORM", DefineValue::Number(2));
    desktop.define("DEBUG", DefineValue::Number(1));
    let outputs = desktop.parse(template).unwrap();
    assert_eq!(
        outputs[0],
        "header\nplatform: desktop\ndebug helpers enabled\nfooter\n"
    );

    // No defines at all: every macro word evaluates as 0.
    let bare = Preprocessor::new();
    let outputs = bare.parse(template).unwrap();
    assert_eq!(outputs[0], "header\nplatform: unknown\nfooter\n");
}

#[test]
fn output_routing_splits_one_source_into_buffers() {
    let source = "\
common prologue\n\
#output 2\n\
#if 1\n\
section two\n\
#endif\n\
#output 0\n\
common epilogue\n";

    let pp = Preprocessor::new();
    let outputs = pp.parse(source).unwrap();
    assert_eq!(outputs.len(), 3);
    assert_eq!(outputs[0], "common prologue\ncommon epilogue\n");
    assert_eq!(outputs[1], "");
    assert_eq!(outputs[2], "section two\n");
}

#[test]
fn text_defines_rewrite_emitted_lines() {
    let mut pp = Preprocessor::new();
    pp.define("PRODUCT", DefineValue::Text("lineforge".to_string()));
    pp.define("VERSION", DefineValue::Number(3));
    let outputs = pp.parse("// PRODUCT release VERSION\n").unwrap();
    assert_eq!(outputs[0], "// lineforge release 3\n");
}

#[test]
fn failure_yields_no_partial_output() {
    let pp = Preprocessor::new();
    let err = pp
        .parse("kept line\n#if 10/0\nnever\n#endif\n")
        .unwrap_err();
    assert_eq!(err.kind(), PreprocessErrorKind::DivisionByZero);
    assert_eq!(err.line(), Some(2));
}

#[test]
fn unterminated_conditional_reports_last_line() {
    let pp = Preprocessor::new();
    let err = pp.parse("#if 1\nbody\n").unwrap_err();
    assert_eq!(err.kind(), PreprocessErrorKind::UnterminatedConditional);
    assert_eq!(err.line(), Some(2));
}

#[test]
fn unknown_directives_follow_policy() {
    let source = "#include <nothing>\ntext\n";

    let strict = Preprocessor::new();
    let err = strict.parse(source).unwrap_err();
    assert_eq!(err.kind(), PreprocessErrorKind::UnknownDirective);
    assert_eq!(err.line(), Some(1));

    let mut lenient = Preprocessor::new();
    lenient.set_unknown_directives(UnknownDirectivePolicy::PassThrough);
    let outputs = lenient.parse(source).unwrap();
    assert_eq!(outputs[0], "#include <nothing>\ntext\n");
}

#[test]
fn alternate_prefix_full_round() {
    let mut pp = Preprocessor::new();
    pp.set_directive_prefix('!');
    pp.define("ON", DefineValue::Number(1));
    let source = "!if ON\nkept #if 0 is plain text here\n!endif\n";
    let outputs = pp.parse(source).unwrap();
    assert_eq!(outputs[0], "kept #if 0 is plain text here\n");
}

#[test]
fn deeply_nested_chains_resolve_first_match() {
    let source = "\
#if 1\n\
#if 0\n\
a\n\
#elif 0\n\
b\n\
#elif 1\n\
c\n\
#elif 1\n\
d\n\
#else\n\
e\n\
#endif\n\
#endif\n";
    let pp = Preprocessor::new();
    assert_eq!(pp.parse(source).unwrap()[0], "c\n");
}

#[test]
fn expander_leaves_untouched_lines_alone() {
    let mut pp = Preprocessor::new();
    pp.define("WORD", DefineValue::Number(1));
    let source = "sword fish WORDS keyword\n";
    // No whole-word match anywhere: the line must survive byte for byte.
    assert_eq!(pp.parse(source).unwrap()[0], source);
}
