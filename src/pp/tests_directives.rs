use super::*;
use crate::diagnostic::{DiagnosticEngine, DiagnosticId};
use crate::lang_options::LangOptions;
use crate::source_manager::{SourceLocation, SourceManager};
use symbol_table::GlobalSymbol as Symbol;

struct PPResult {
    tokens: Vec<Token>,
    diag: DiagnosticEngine,
    summary: DirectiveSummary,
}

fn preprocess(src: &str) -> PPResult {
    preprocess_with(src, PPConfig::default(), LangOptions::default(), &[])
}

fn preprocess_with(src: &str, config: PPConfig, lang_opts: LangOptions, includes: &[(&str, &str)]) -> PPResult {
    let _ = env_logger::try_init();

    let mut source_manager = SourceManager::new();
    let mut diag = DiagnosticEngine::new();
    source_manager.add_input(&[src], None);
    for (name, text) in includes {
        source_manager.add_include_source(name, text);
    }

    let mut preprocessor = Preprocessor::new(&mut source_manager, &mut diag, config, lang_opts);
    let tokens = preprocessor.process().unwrap();
    let summary = preprocessor.summary().clone();
    let tokens = tokens.into_iter().filter(|t| !t.is_eof()).collect();
    PPResult { tokens, diag, summary }
}

fn texts(tokens: &[Token]) -> Vec<&'static str> {
    tokens.iter().map(|t| t.text()).collect()
}

#[test]
fn test_version_directive() {
    let result = preprocess("// leading comment\n#version 300 es\n__VERSION__");
    assert!(result.diag.diagnostics().is_empty());
    assert_eq!(result.summary.version, Some(300));
    assert_eq!(result.tokens[0].int_value(), Some(300));

    let result = preprocess("#version 100\n__VERSION__");
    assert_eq!(result.summary.version, Some(100));
    assert_eq!(result.tokens[0].int_value(), Some(100));
}

#[test]
fn test_default_version_macro() {
    let result = preprocess("__VERSION__ GL_ES");
    assert_eq!(texts(&result.tokens), vec!["100", "1"]);
    assert_eq!(result.summary.version, None);
}

#[test]
fn test_version_must_come_first() {
    let result = preprocess("float x;\n#version 100");
    assert_eq!(result.diag.ids(), vec![DiagnosticId::VersionNotFirstStatement]);
    assert_eq!(result.summary.version, None);

    let result = preprocess("#define A\n#version 100");
    assert_eq!(result.diag.ids(), vec![DiagnosticId::VersionNotFirstStatement]);
}

#[test]
fn test_invalid_versions() {
    assert_eq!(preprocess("#version 110").diag.ids(), vec![DiagnosticId::InvalidVersionNumber]);
    assert_eq!(preprocess("#version").diag.ids(), vec![DiagnosticId::InvalidVersionNumber]);
    assert_eq!(preprocess("#version 300").diag.ids(), vec![DiagnosticId::InvalidVersionDirective]);
    assert_eq!(preprocess("#version 100 es").diag.ids(), vec![DiagnosticId::InvalidVersionDirective]);
}

#[test]
fn test_extension_directive() {
    let lang_opts = LangOptions {
        extensions: vec!["GL_OES_standard_derivatives".to_string()],
        ..Default::default()
    };
    let src = "#extension GL_OES_standard_derivatives : enable\n#extension all : warn\nGL_OES_standard_derivatives";
    let result = preprocess_with(src, PPConfig::default(), lang_opts, &[]);
    assert!(result.diag.diagnostics().is_empty());
    let recorded: Vec<_> = result
        .summary
        .extensions
        .iter()
        .map(|(name, behavior)| (name.as_str(), *behavior))
        .collect();
    assert_eq!(
        recorded,
        vec![
            ("GL_OES_standard_derivatives", ExtensionBehavior::Enable),
            ("all", ExtensionBehavior::Warn),
        ]
    );
    // supported extensions are predefined as macros
    assert_eq!(texts(&result.tokens), vec!["1"]);
}

#[test]
fn test_invalid_extension_directives() {
    let cases = [
        ("#extension 42 : enable", DiagnosticId::InvalidExtensionName),
        ("#extension foo enable", DiagnosticId::UnexpectedToken),
        ("#extension foo : maybe", DiagnosticId::InvalidExtensionBehavior),
        ("#extension foo : enable extra", DiagnosticId::InvalidExtensionDirective),
        ("#extension all : require", DiagnosticId::InvalidExtensionBehavior),
        ("#extension GL_EXT_unknown : require", DiagnosticId::InvalidExtensionName),
    ];
    for (src, expected) in cases {
        let result = preprocess(src);
        assert_eq!(result.diag.ids(), vec![expected], "{}", src);
        assert!(result.summary.extensions.is_empty(), "{}", src);
    }
}

#[test]
fn test_pragmas() {
    let result = preprocess("#pragma STDGL invariant(all)\n#pragma optimize(off)\n#pragma mystery\n#pragma");
    assert_eq!(result.diag.ids(), vec![DiagnosticId::UnrecognizedPragma]);
    assert!(!result.diag.has_errors());

    let pragmas = &result.summary.pragmas;
    assert_eq!(pragmas.len(), 3);
    assert_eq!(pragmas[0].name, "invariant");
    assert_eq!(pragmas[0].value.as_deref(), Some("all"));
    assert!(pragmas[0].stdgl);
    assert_eq!(pragmas[1].name, "optimize");
    assert_eq!(pragmas[1].value.as_deref(), Some("off"));
    assert_eq!(pragmas[2].name, "mystery");
    assert_eq!(pragmas[2].value, None);
}

#[test]
fn test_malformed_pragma() {
    let result = preprocess("#pragma debug(on");
    assert_eq!(result.diag.ids(), vec![DiagnosticId::UnrecognizedPragma]);
    assert!(result.summary.pragmas.is_empty());
}

#[test]
fn test_error_directive() {
    let result = preprocess("#error this  shader is broken\nx");
    assert_eq!(result.diag.ids(), vec![DiagnosticId::ErrorDirective]);
    assert_eq!(
        result.diag.diagnostics()[0].message,
        "#error: 'this shader is broken'"
    );
    assert_eq!(texts(&result.tokens), vec!["x"]);
}

#[test]
fn test_error_directive_in_skipped_group() {
    let result = preprocess("#if 0\n#error never\n#endif");
    assert!(result.diag.diagnostics().is_empty());
}

#[test]
fn test_line_directive() {
    let result = preprocess("#line 10\na\nb\n#line 20 3\nc");
    assert!(result.diag.diagnostics().is_empty());
    assert_eq!(result.tokens[0].location, SourceLocation::new(0, 10, 1));
    assert_eq!(result.tokens[1].location, SourceLocation::new(0, 11, 1));
    assert_eq!(result.tokens[2].location, SourceLocation::new(3, 20, 1));
}

#[test]
fn test_line_directive_expands_macros() {
    let result = preprocess("#define BASE 50\n#line BASE\n__LINE__");
    assert_eq!(result.tokens[0].int_value(), Some(50));
}

#[test]
fn test_invalid_line_directives() {
    assert_eq!(preprocess("#line x").diag.ids(), vec![DiagnosticId::InvalidLineNumber]);
    assert_eq!(preprocess("#line 1 y").diag.ids(), vec![DiagnosticId::InvalidFileNumber]);
    assert_eq!(preprocess("#line 1 2 3").diag.ids(), vec![DiagnosticId::InvalidLineDirective]);
    assert_eq!(preprocess("#line").diag.ids(), vec![DiagnosticId::InvalidLineDirective]);
}

#[test]
fn test_invalid_directive_name() {
    let result = preprocess("#foo bar\n# \nx");
    assert_eq!(result.diag.ids(), vec![DiagnosticId::DirectiveInvalidName]);
    assert_eq!(texts(&result.tokens), vec!["x"]);
}

#[test]
fn test_hash_not_at_line_start() {
    let result = preprocess("a # define B");
    assert_eq!(result.diag.ids(), vec![DiagnosticId::InvalidCharacter]);
    assert_eq!(texts(&result.tokens), vec!["a", "define", "B"]);
}

#[test]
fn test_define_errors() {
    let cases = [
        ("#define GL_FOO 1", DiagnosticId::MacroNameReserved),
        ("#define A__B 1", DiagnosticId::MacroNameReserved),
        ("#define __LINE__ 1", DiagnosticId::MacroPredefinedRedefined),
        ("#undef GL_ES", DiagnosticId::MacroPredefinedUndefined),
        ("#define F(a, a) a", DiagnosticId::MacroDuplicateParameter),
        ("#define F(a b) a", DiagnosticId::UnexpectedToken),
        ("#define 1 2", DiagnosticId::UnexpectedToken),
        ("#define", DiagnosticId::UnexpectedToken),
        ("#define M 1\n#define M 2", DiagnosticId::MacroRedefined),
    ];
    for (src, expected) in cases {
        assert_eq!(preprocess(src).diag.ids(), vec![expected], "{}", src);
    }
}

#[test]
fn test_identical_redefinition_allowed() {
    let result = preprocess("#define M(x) (x + 1)\n#define M(x)   (x + 1)\nM(2)");
    assert!(result.diag.diagnostics().is_empty());
    assert_eq!(texts(&result.tokens), vec!["(", "2", "+", "1", ")"]);
}

#[test]
fn test_include_in_memory_source() {
    let result = preprocess_with(
        "#include \"common.glsl\"\nONE main",
        PPConfig::default(),
        LangOptions::default(),
        &[("common.glsl", "#define ONE 1\nfrom_include\n")],
    );
    assert!(result.diag.diagnostics().is_empty());
    assert_eq!(texts(&result.tokens), vec!["from_include", "1", "main"]);
    assert_eq!(result.tokens[0].location, SourceLocation::new(1, 2, 1));
    assert_eq!(result.tokens[1].location, SourceLocation::new(0, 2, 1));
}

#[test]
fn test_include_from_include_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("lib.glsl"), "#define FROM_DISK 7\n").unwrap();
    let config = PPConfig {
        include_paths: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    let result = preprocess_with("#include \"lib.glsl\"\nFROM_DISK", config, LangOptions::default(), &[]);
    assert!(result.diag.diagnostics().is_empty());
    assert_eq!(result.tokens[0].int_value(), Some(7));
}

#[test]
fn test_include_errors() {
    assert_eq!(
        preprocess("#include \"missing.glsl\"").diag.ids(),
        vec![DiagnosticId::IncludeNotFound]
    );
    assert_eq!(preprocess("#include missing").diag.ids(), vec![DiagnosticId::InvalidIncludeDirective]);
}

#[test]
fn test_unterminated_conditional_in_include() {
    let result = preprocess_with(
        "#include \"open.glsl\"\nafter",
        PPConfig::default(),
        LangOptions::default(),
        &[("open.glsl", "#if 1\ninside\n")],
    );
    assert_eq!(result.diag.ids(), vec![DiagnosticId::ConditionalUnterminated]);
    assert_eq!(texts(&result.tokens), vec!["inside", "after"]);
}

#[test]
fn test_include_cannot_close_including_conditional() {
    let includes = [
        ("else.glsl", "#else\nhidden\n"),
        ("elif.glsl", "#elif 0\nshown\n"),
        ("endif.glsl", "#endif\n"),
    ];
    let result = preprocess_with(
        "#if 1\n#include \"else.glsl\"\n#include \"elif.glsl\"\n#include \"endif.glsl\"\nafter\n#endif",
        PPConfig::default(),
        LangOptions::default(),
        &includes,
    );
    assert_eq!(
        result.diag.ids(),
        vec![
            DiagnosticId::ConditionalElseWithoutIf,
            DiagnosticId::ConditionalElifWithoutIf,
            DiagnosticId::ConditionalEndifWithoutIf,
        ]
    );
    assert_eq!(texts(&result.tokens), vec!["hidden", "shown", "after"]);
    assert_eq!(result.diag.diagnostics()[0].location.source_index, 1);
}

#[test]
fn test_recursive_include_is_fatal() {
    let _ = env_logger::try_init();
    let mut source_manager = SourceManager::new();
    let mut diag = DiagnosticEngine::new();
    source_manager.add_input(&["#include \"self.glsl\""], None);
    source_manager.add_include_source("self.glsl", "#include \"self.glsl\"\n");
    let config = PPConfig {
        max_include_depth: 5,
        ..Default::default()
    };
    let mut preprocessor = Preprocessor::new(&mut source_manager, &mut diag, config, LangOptions::default());
    let err = preprocessor.process().unwrap_err();
    assert!(matches!(err, PPError::IncludeDepthExceeded { ref name, .. } if name == "self.glsl"));
}

#[test]
fn test_fragment_precision_macro() {
    let lang_opts = LangOptions {
        fragment_precision_high: true,
        ..Default::default()
    };
    let src = "#ifdef GL_FRAGMENT_PRECISION_HIGH\nhigh\n#endif";
    let result = preprocess_with(src, PPConfig::default(), lang_opts, &[]);
    assert_eq!(texts(&result.tokens), vec!["high"]);
    assert!(preprocess(src).tokens.is_empty());
}

#[test]
fn test_macro_table_after_processing() {
    let _ = env_logger::try_init();
    let mut source_manager = SourceManager::new();
    let mut diag = DiagnosticEngine::new();
    source_manager.add_input(&["#define USED 1\n#define UNUSED 2\nUSED"], None);
    let mut preprocessor =
        Preprocessor::new(&mut source_manager, &mut diag, PPConfig::default(), LangOptions::default());
    preprocessor.process().unwrap();
    let macros = preprocessor.macros();
    let used = macros.get(Symbol::new("USED")).unwrap();
    assert!(used.flags.contains(MacroFlags::USED));
    assert!(!used.is_disabled());
    assert!(!macros.get(Symbol::new("UNUSED")).unwrap().flags.contains(MacroFlags::USED));
    assert!(preprocessor.is_macro_defined("GL_ES"));
}
