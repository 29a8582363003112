pub mod tile_records;
