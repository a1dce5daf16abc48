//! Database table operations

mod artist_table;
mod playlist_table;
mod track_table;
mod user_table;

pub use artist_table::ArtistTable;
pub use playlist_table::PlaylistTable;
pub use track_table::TrackTable;
pub use user_table::UserTable;
