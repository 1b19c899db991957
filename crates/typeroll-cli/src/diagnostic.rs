//! Declaration-diagnostic reporting using codespan-reporting.

use std::collections::HashMap;
use std::fs;

use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use typeroll::EmitDiagnostic;

/// Render the collected per-file emitter diagnostics to stderr. These are
/// warnings from the caller's point of view: the bundle still succeeded
/// with whatever partial declaration text was produced.
pub fn report_emit_diagnostics(diagnostics: &[EmitDiagnostic]) {
    let mut files: SimpleFiles<String, String> = SimpleFiles::new();
    let mut file_ids: HashMap<String, usize> = HashMap::new();

    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();

    for diagnostic in diagnostics {
        let name = diagnostic.file.display().to_string();
        file_ids.entry(name.clone()).or_insert_with(|| {
            let source = fs::read_to_string(&diagnostic.file).unwrap_or_default();
            files.add(name.clone(), source)
        });

        let rendered = Diagnostic::warning()
            .with_message(&diagnostic.message)
            .with_notes(vec![format!("in {name}")]);
        let _ = term::emit(&mut writer.lock(), &config, &files, &rendered);
    }
}
