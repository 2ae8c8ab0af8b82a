//! LSP session controller.
//!
//! `Backend` wires the document store, the config resolver, and the unit
//! converter to the protocol lifecycle. Transport, framing, and dispatch
//! belong to tower-lsp; everything here assumes the client's per-document
//! notification ordering and tolerates concurrent dispatch across
//! documents.

use crate::config::EffectiveConfig;
use crate::convert;
use crate::documents::DocumentStore;
use crate::global_config::GlobalConfigStore;
use crate::workspace::ConfigResolver;
use std::sync::Arc;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionList, CompletionOptions, CompletionParams,
    CompletionResponse, CompletionTextEdit, DidChangeTextDocumentParams,
    DidChangeWorkspaceFoldersParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    InitializeParams, InitializeResult, InitializedParams, MessageType, OneOf, Position, Range,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind, TextEdit,
    WorkspaceFoldersServerCapabilities, WorkspaceServerCapabilities,
};
use tower_lsp::{Client, LanguageServer};

/// LSP backend offering px→vw completion.
pub struct Backend {
    client: Client,
    documents: DocumentStore,
    resolver: ConfigResolver,
    global: Arc<GlobalConfigStore>,
}

impl Backend {
    pub fn new(client: Client, global: Arc<GlobalConfigStore>) -> Self {
        Self {
            client,
            documents: DocumentStore::new(),
            resolver: ConfigResolver::new(Arc::clone(&global)),
            global,
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    #[allow(deprecated)] // root_uri is the pre-workspace-folder handshake
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(folders) = params.workspace_folders {
            for folder in folders {
                if let Ok(path) = folder.uri.to_file_path() {
                    self.resolver.add_root(path);
                }
            }
        } else if let Some(root_uri) = params.root_uri {
            if let Ok(path) = root_uri.to_file_path() {
                self.resolver.add_root(path);
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec!["x".into()]),
                    ..Default::default()
                }),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("server initialized");
        self.client
            .log_message(MessageType::INFO, "pxvw-lsp ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.global.shutdown();
        Ok(())
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        for removed in params.event.removed {
            if let Ok(path) = removed.uri.to_file_path() {
                tracing::info!("workspace folder removed: {}", path.display());
                self.resolver.remove_root(&path);
            }
        }
        for added in params.event.added {
            if let Ok(path) = added.uri.to_file_path() {
                tracing::info!("workspace folder added: {}", path.display());
                self.resolver.add_root(path);
            }
        }
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        tracing::debug!("didOpen: {}", params.text_document.uri);
        self.documents
            .open(params.text_document.uri, &params.text_document.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        tracing::debug!("didChange: {}", params.text_document.uri);
        // Full sync: the last content change carries the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.replace(params.text_document.uri, &change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        tracing::debug!("didClose: {}", params.text_document.uri);
        self.documents.close(&params.text_document.uri);
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        // A request racing a close is expected; degrade to no suggestion.
        let Some(line) = self.documents.line_at(&uri, position.line) else {
            tracing::debug!("completion for unknown document or line: {uri}");
            return Ok(Some(empty_completion_list()));
        };

        let document_path = uri.to_file_path().unwrap_or_default();
        let config = self.resolver.resolve_for(&document_path);

        let items = match vw_completion(&line, position, &config)? {
            Some(item) => vec![item],
            None => Vec::new(),
        };

        Ok(Some(CompletionResponse::List(CompletionList {
            is_incomplete: false,
            items,
        })))
    }
}

fn empty_completion_list() -> CompletionResponse {
    CompletionResponse::List(CompletionList {
        is_incomplete: false,
        items: Vec::new(),
    })
}

/// Build the single px→vw suggestion for a cursor position, if the text up
/// to the cursor ends in a pixel length.
///
/// The only error case is a numeric capture that fails to parse, which the
/// pattern rules out; it surfaces as an internal error failing this one
/// request.
fn vw_completion(
    line: &str,
    position: Position,
    config: &EffectiveConfig,
) -> Result<Option<CompletionItem>> {
    let prefix = &line[..byte_index_at_utf16_column(line, position.character)];
    let cursor = prefix.chars().map(char::len_utf16).sum::<usize>() as u32;

    let Some(px_text) = convert::px_suffix(prefix) else {
        return Ok(None);
    };

    let px: f64 = px_text.parse().map_err(|e| {
        let mut error = Error::internal_error();
        error.message = format!("failed to parse px value {px_text:?}: {e}").into();
        error
    })?;

    let vw_text = convert::format_vw(
        convert::px_to_vw(px, config.viewport_width),
        config.unit_precision,
    );
    let label = format!("{vw_text}vw");

    // The matched text is ASCII, so its char count equals its UTF-16
    // length; the edit covers the number plus the two-character unit.
    let start = cursor - px_text.len() as u32 - 2;

    Ok(Some(CompletionItem {
        label: label.clone(),
        kind: Some(CompletionItemKind::UNIT),
        filter_text: Some(format!("{px_text}px")),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range: Range {
                start: Position::new(position.line, start),
                end: Position::new(position.line, cursor),
            },
            new_text: label,
        })),
        ..Default::default()
    }))
}

/// Byte index of a UTF-16 column in `line`, clamped to the line length.
/// LSP columns count UTF-16 code units.
fn byte_index_at_utf16_column(line: &str, column: u32) -> usize {
    let mut utf16 = 0u32;
    for (index, ch) in line.char_indices() {
        if utf16 >= column {
            return index;
        }
        utf16 += ch.len_utf16() as u32;
    }
    line.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(viewport_width: f64, unit_precision: u32) -> EffectiveConfig {
        EffectiveConfig {
            viewport_width,
            unit_precision,
        }
    }

    #[test]
    fn suggestion_replaces_the_pixel_length() {
        let line = "width: 100px";
        let item = vw_completion(line, Position::new(0, 12), &config(1440.0, 3))
            .unwrap()
            .expect("cursor after px should produce a suggestion");

        assert_eq!(item.label, "6.944vw");
        assert_eq!(item.filter_text.as_deref(), Some("100px"));

        let Some(CompletionTextEdit::Edit(edit)) = item.text_edit else {
            panic!("expected a plain text edit");
        };
        assert_eq!(edit.new_text, "6.944vw");
        assert_eq!(edit.range.start, Position::new(0, 7));
        assert_eq!(edit.range.end, Position::new(0, 12));
    }

    #[test]
    fn cursor_inside_the_unit_yields_nothing() {
        let line = "width: 100px";
        let item = vw_completion(line, Position::new(0, 11), &config(1440.0, 3)).unwrap();
        assert!(item.is_none());
    }

    #[test]
    fn pixel_value_equal_to_viewport_is_one_hundred() {
        let line = "width: 1440px";
        let item = vw_completion(line, Position::new(0, 13), &config(1440.0, 3))
            .unwrap()
            .unwrap();
        assert_eq!(item.label, "100.000vw");
    }

    #[test]
    fn precision_zero_suggestion_has_no_decimal_point() {
        let line = "width: 100px";
        let item = vw_completion(line, Position::new(0, 12), &config(1440.0, 0))
            .unwrap()
            .unwrap();
        assert_eq!(item.label, "7vw");
    }

    #[test]
    fn negative_pixel_length_is_converted() {
        let line = "margin: -20px";
        let item = vw_completion(line, Position::new(0, 13), &config(1440.0, 3))
            .unwrap()
            .unwrap();
        assert_eq!(item.label, "-1.389vw");

        let Some(CompletionTextEdit::Edit(edit)) = item.text_edit else {
            panic!("expected a plain text edit");
        };
        assert_eq!(edit.range.start, Position::new(0, 8));
    }

    #[test]
    fn decimal_pixel_length_is_converted() {
        let line = "width: 720.5px";
        let item = vw_completion(line, Position::new(0, 14), &config(1440.0, 2))
            .unwrap()
            .unwrap();
        assert_eq!(item.label, "50.03vw");
        assert_eq!(item.filter_text.as_deref(), Some("720.5px"));
    }

    #[test]
    fn plain_text_line_yields_nothing() {
        let item = vw_completion("width: 100%", Position::new(0, 11), &config(1440.0, 3)).unwrap();
        assert!(item.is_none());
    }

    #[test]
    fn columns_count_utf16_code_units() {
        // "宽" is one UTF-16 code unit but three UTF-8 bytes; the prefix cut
        // and the edit span must both use UTF-16 columns.
        let line = "宽: 100px";
        let item = vw_completion(line, Position::new(0, 8), &config(1440.0, 3))
            .unwrap()
            .expect("cursor after px should produce a suggestion");

        let Some(CompletionTextEdit::Edit(edit)) = item.text_edit else {
            panic!("expected a plain text edit");
        };
        assert_eq!(edit.range.start, Position::new(0, 3));
        assert_eq!(edit.range.end, Position::new(0, 8));
    }

    #[test]
    fn column_past_the_line_end_is_clamped() {
        let line = "width: 100px";
        let item = vw_completion(line, Position::new(0, 40), &config(1440.0, 3))
            .unwrap()
            .unwrap();
        assert_eq!(item.label, "6.944vw");

        // The edit span is anchored to the actual line content.
        let Some(CompletionTextEdit::Edit(edit)) = item.text_edit else {
            panic!("expected a plain text edit");
        };
        assert_eq!(edit.range.start, Position::new(0, 7));
        assert_eq!(edit.range.end, Position::new(0, 12));
    }

    #[test]
    fn utf16_column_to_byte_index() {
        assert_eq!(byte_index_at_utf16_column("abc", 0), 0);
        assert_eq!(byte_index_at_utf16_column("abc", 2), 2);
        assert_eq!(byte_index_at_utf16_column("abc", 10), 3);
        // "宽" occupies 3 bytes, 1 UTF-16 unit; "𝕎" occupies 4 bytes, 2 units.
        assert_eq!(byte_index_at_utf16_column("宽x", 1), 3);
        assert_eq!(byte_index_at_utf16_column("𝕎x", 2), 4);
    }
}
