use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the collection database")]
    Database,
    #[display("could not read the collection")]
    Collection,
    #[display("no item matches '{_0}'")]
    NoMatch(#[error(not(source))] String),
    #[display("'{prefix}' matches {count} items, be more specific")]
    Ambiguous { prefix: String, count: usize },
    #[display("invalid tag")]
    Tag,
    #[display("{_0} operation(s) failed")]
    Failures(#[error(not(source))] usize),
}
