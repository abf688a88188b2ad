//! End-to-end tests for the eis front end
//!
//! Each test runs the full pipeline (scan, parse, resolve) the way the CLI
//! does. Import tests write module files into a scratch directory under the
//! system temp dir.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use eisc::{Diagnostics, Module, ModuleRegistry, compile};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// A scratch directory of module files, removed on drop
struct Fixture {
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = std::env::temp_dir().join(format!(
            "eisc-test-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&root).expect("failed to create fixture dir");
        Self { root }
    }

    fn write(&self, name: &str, contents: &str) -> &Self {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture subdir");
        }
        fs::write(path, contents).expect("failed to write fixture file");
        self
    }

    /// Compile `name` from this directory the way the CLI would
    fn compile(&self, name: &str) -> (Module, ModuleRegistry, Diagnostics) {
        let source = fs::read_to_string(self.root.join(name)).expect("failed to read entry file");
        let mut diagnostics = Diagnostics::buffered();
        let mut registry = ModuleRegistry::new();
        let module = compile(
            &source,
            name,
            self.root.clone(),
            &mut registry,
            &mut diagnostics,
        );
        (module, registry, diagnostics)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn compile_source(source: &str) -> (Module, ModuleRegistry, Diagnostics) {
    let mut diagnostics = Diagnostics::buffered();
    let mut registry = ModuleRegistry::new();
    let module = compile(
        source,
        "main.eis",
        PathBuf::new(),
        &mut registry,
        &mut diagnostics,
    );
    (module, registry, diagnostics)
}

#[test]
fn compiles_a_small_program() {
    let (module, _, diagnostics) = compile_source(
        "fn fib(n: int) -> int {\n\
         if n < 2 {\n\
         return n\n\
         }\n\
         return fib(n - 1) + fib(n - 2)\n\
         }\n\
         var result = fib(10)\n",
    );
    assert!(!diagnostics.had_error());
    assert_eq!(module.statements.len(), 2);
    assert!(module.functions.contains_key("fib"));
}

#[test]
fn reports_and_recovers_from_multiple_errors() {
    let (module, _, diagnostics) = compile_source(
        "var = 1;\n\
         var ok = 2;\n\
         var bad = missing;\n",
    );
    assert!(diagnostics.had_error());
    // Both good declarations survive recovery
    assert_eq!(module.statements.len(), 2);
}

#[test]
fn import_loads_and_resolves_the_module() {
    let fixture = Fixture::new();
    fixture
        .write(
            "math.eis",
            "fn double(x: int) -> int { return x * 2; }\n",
        )
        .write(
            "main.eis",
            "import \"math.eis\"\n\
             var d = double(21)\n",
        );

    let (module, registry, diagnostics) = fixture.compile("main.eis");
    assert!(!diagnostics.had_error());
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.module(0).name, "math.eis");
    assert_eq!(registry.depth(0), 1);
    assert_eq!(module.imported, vec![0]);
}

#[test]
fn scope_access_reaches_imported_functions() {
    let fixture = Fixture::new();
    fixture
        .write("math.eis", "fn triple(x: int) -> int { return x * 3; }\n")
        .write(
            "main.eis",
            "import \"math.eis\"\n\
             var t = math::triple(3)\n",
        );

    let (_, _, diagnostics) = fixture.compile("main.eis");
    assert!(!diagnostics.had_error());
}

#[test]
fn missing_import_reports_and_continues() {
    let fixture = Fixture::new();
    fixture.write(
        "main.eis",
        "import \"a/b/m.eis\"\n\
         var x = 1\n",
    );

    let (module, registry, mut diagnostics) = fixture.compile("main.eis");
    assert!(diagnostics.had_error());
    assert!(
        diagnostics
            .take_output()
            .contains("Unable to open module 'm.eis'")
    );
    // Registry unchanged, parsing continued
    assert_eq!(registry.len(), 0);
    assert_eq!(module.statements.len(), 1);
}

#[test]
fn self_import_is_an_error() {
    let fixture = Fixture::new();
    fixture.write("main.eis", "import \"main.eis\"\n");

    let (_, _, mut diagnostics) = fixture.compile("main.eis");
    assert!(diagnostics.had_error());
    assert!(
        diagnostics
            .take_output()
            .contains("Cannot import module with the same name as the current one")
    );
}

#[test]
fn modules_are_deduplicated_by_name() {
    let fixture = Fixture::new();
    fixture
        .write("shared.eis", "var counter = 0\n")
        .write("a.eis", "import \"shared.eis\"\n")
        .write("b.eis", "import \"shared.eis\"\n")
        .write(
            "main.eis",
            "import \"a.eis\"\n\
             import \"b.eis\"\n",
        );

    let (_, registry, diagnostics) = fixture.compile("main.eis");
    assert!(!diagnostics.had_error());
    // shared, a, b; shared parsed once
    assert_eq!(registry.len(), 3);
    let shared = registry.find_by_name("shared.eis").unwrap();
    assert_eq!(registry.depth(shared), 2);
}

#[test]
fn reimporting_from_deeper_raises_depths_monotonically() {
    let fixture = Fixture::new();
    // main imports shared at depth 1, then a whose import of shared makes
    // the longest chain main -> a -> shared
    fixture
        .write("shared.eis", "var counter = 0\n")
        .write("a.eis", "import \"shared.eis\"\n")
        .write(
            "main.eis",
            "import \"shared.eis\"\n\
             import \"a.eis\"\n",
        );

    let (_, registry, diagnostics) = fixture.compile("main.eis");
    assert!(!diagnostics.had_error());
    let shared = registry.find_by_name("shared.eis").unwrap();
    let a = registry.find_by_name("a.eis").unwrap();
    assert_eq!(registry.depth(a), 1);
    assert_eq!(registry.depth(shared), 2);
}

#[test]
fn circular_imports_terminate_with_an_error() {
    let fixture = Fixture::new();
    fixture
        .write("a.eis", "import \"b.eis\"\n")
        .write("b.eis", "import \"a.eis\"\n");

    let (_, _, mut diagnostics) = fixture.compile("a.eis");
    assert!(diagnostics.had_error());
    assert!(diagnostics.take_output().contains("Circular import"));
}

#[test]
fn imported_classes_are_usable() {
    let fixture = Fixture::new();
    fixture
        .write(
            "point.eis",
            "class Point {\n\
             public var x: int = 0\n\
             public var y: int = 0\n\
             public fn Point(x: int, y: int) -> null {\n\
             this.x = x\n\
             this.y = y\n\
             }\n\
             }\n",
        )
        .write(
            "main.eis",
            "import \"point.eis\"\n\
             var p = Point(1, 2)\n\
             var x: int = p.x\n",
        );

    let (_, _, diagnostics) = fixture.compile("main.eis");
    assert!(!diagnostics.had_error());
}

#[test]
fn errors_in_imported_module_still_register_it() {
    let fixture = Fixture::new();
    fixture
        .write("broken.eis", "var = 1\n")
        .write("main.eis", "import \"broken.eis\"\n");

    let (_, registry, diagnostics) = fixture.compile("main.eis");
    assert!(diagnostics.had_error());
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.module(0).name, "broken.eis");
}

#[test]
fn same_diagnostics_on_repeated_runs() {
    let source = "var = 1;\nx++;\nvar ok = true ? 1 : \"two\";\n";
    let (_, _, mut first) = compile_source(source);
    let (_, _, mut second) = compile_source(source);
    assert_eq!(first.take_output(), second.take_output());
}

#[test]
fn diagnostics_name_the_module_and_location() {
    let (_, _, mut diagnostics) = compile_source("var x = missing;\n");
    let output = diagnostics.take_output();
    assert!(output.contains("main.eis"));
    assert!(output.contains("Undefined name 'missing'"));
}
