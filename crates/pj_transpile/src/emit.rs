//! JavaScript emission through the SWC code generator.
//!
//! The synthesized text is registered as the only file of a fresh
//! `SourceMap`, the tree is lowered with spans anchored on that file, and the
//! SWC emitter prints it. The optional source map therefore maps printed
//! code back to the synthesized text.

use anyhow::{Context, Result};
use swc_common::{source_map::DefaultSourceMapGenConfig, sync::Lrc, FileName, SourceMap};
use swc_ecma_codegen::{text_writer::JsWriter, Emitter, Node};

use crate::driver::Transpiled;

pub struct Emitted {
    pub code: String,
    /// Source map JSON, when requested.
    pub source_map: Option<String>,
}

/// Print `transpiled` as JavaScript. `filename` names the synthesized text in
/// the source map.
pub fn emit_js(transpiled: &Transpiled, filename: &str, source_map: bool) -> Result<Emitted> {
    let cm: Lrc<SourceMap> = Default::default();
    let file = cm.new_source_file(
        Lrc::new(FileName::Custom(filename.to_string())),
        transpiled.text.clone(),
    );
    let module = pj_ast::lower_program(&transpiled.program, file.start_pos);

    let mut buf = Vec::new();
    let mut srcmap_buf = if source_map { Some(vec![]) } else { None };
    {
        let writer = JsWriter::new(cm.clone(), "\n", &mut buf, srcmap_buf.as_mut());
        let mut emitter = Emitter {
            cfg: swc_ecma_codegen::Config::default()
                .with_target(swc_ecma_ast::EsVersion::latest()),
            cm: cm.clone(),
            comments: None,
            wr: writer,
        };
        module
            .emit_with(&mut emitter)
            .context("failed to print JavaScript")?;
    }

    let code = String::from_utf8(buf)?;

    let source_map = match srcmap_buf {
        Some(srcmap_data) => {
            let srcmap = cm.build_source_map(&srcmap_data, None, DefaultSourceMapGenConfig);
            let mut srcmap_json = vec![];
            srcmap
                .to_writer(&mut srcmap_json)
                .context("failed to serialize source map")?;
            Some(String::from_utf8(srcmap_json)?)
        }
        None => None,
    };

    Ok(Emitted { code, source_map })
}
