pub const USER_AGENT: &str = concat!("Marquee/", env!("CARGO_PKG_VERSION"));

pub mod providers {

    pub const TMDB_API: &str = "https://api.themoviedb.org/3";

    pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

    pub const OMDB_API: &str = "https://www.omdbapi.com/";

    pub const ROTTEN_TOMATOES_BASE: &str = "https://www.rottentomatoes.com/m/";

    /// OMDb's placeholder for a field it has no value for.
    pub const NOT_AVAILABLE: &str = "N/A";
}

pub mod limits {

    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    pub const MAX_PAGE_SIZE: u32 = 100;

    pub const DEFAULT_LOG_PAGE_SIZE: u64 = 50;

    pub const MAX_LOG_PAGE_SIZE: u64 = 500;
}
