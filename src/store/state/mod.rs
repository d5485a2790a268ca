mod tables;
mod volatile;

pub(crate) use self::tables::Tables;
pub(crate) use self::volatile::Volatile;
