pub mod postcodes_io;
pub mod supabase;
