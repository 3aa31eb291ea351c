mod item;
mod meta;

pub use self::item::ItemRow;
pub(crate) use self::meta::MetaProxy;
