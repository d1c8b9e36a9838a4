//! Pure decision logic behind clipboard image pasting: where images land, how references to
//! them are escaped, and how `file:` URIs map to local paths.

pub mod escape;
pub mod file_uri;
pub mod root_dir;
pub mod syntax;
mod types;

pub use escape::escape_for_markdown;
pub use escape::escape_for_rst;
pub use file_uri::FileUriError;
pub use file_uri::PathStyle;
pub use file_uri::decode_file_uri;
pub use file_uri::decode_file_uri_as;
pub use file_uri::encode_file_uri;
pub use file_uri::encode_file_uri_as;
pub use root_dir::PasteContext;
pub use root_dir::RootDirError;
pub use root_dir::resolve_root_dir;
pub use root_dir::resolve_root_dir_with;
pub use syntax::Insertion;
pub use syntax::SyntaxKind;
pub use syntax::reference_for;
pub use types::ByteRange;
pub use types::EncodedImageFormat;
pub use types::ImageReference;
