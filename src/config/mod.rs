mod settings;

pub use settings::{
    CacheConfig, CacheMode, CacheProvider, ResolverConfig, Settings, load_settings,
};
