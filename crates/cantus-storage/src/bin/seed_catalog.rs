use cantus_core::domain::{Artist, CatalogEntity, OwnerId, Song};
use cantus_core::ports::CatalogStore;
use cantus_storage::{SqliteCatalogStore, StorageConfig};

// Usage: seed_catalog <owner> [artists] [songs-per-artist]
fn main() {
  let mut args = std::env::args().skip(1);
  let owner = OwnerId::new(args.next().unwrap_or_else(|| "demo".to_string()));
  let artists: usize = args.next().and_then(|a| a.parse().ok()).unwrap_or(120);
  let songs_per_artist: usize = args.next().and_then(|a| a.parse().ok()).unwrap_or(3);

  let config = StorageConfig::load().expect("failed to load storage config");
  let store = SqliteCatalogStore::from_config(&config).expect("failed to open catalog");

  println!("Seeding {artists} artists for owner {owner} into {}", config.db_path.display());

  store
    .run_atomic(|tx| {
      for i in 0..artists {
        let mut artist = Artist::new(owner.clone(), format!("Artist {i:03}"));
        artist.add_synonym(&format!("A{i:03}"));
        tx.save_artist(&artist)?;

        for n in 0..songs_per_artist {
          let mut song = Song::new(owner.clone(), format!("Song {i:03}-{n}")).by(artist.id);
          song.track_no = i32::try_from(n + 1).ok();
          song.duration_ms = Some(180_000 + (n as i64) * 1_000);
          tx.save_song(&song)?;
        }
      }
      Ok(())
    })
    .expect("failed to seed catalog");

  println!("Done.");
}
