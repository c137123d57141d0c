use crate::config::Config;
use crate::models::EnrichmentSource;
use crate::services::EnrichmentService;

pub async fn cmd_enrich(config: &Config, tmdb_id: i64) -> anyhow::Result<()> {
    let service = EnrichmentService::from_config(&config.metadata);
    let enriched = service.movie_details(tmdb_id).await?;
    let movie = &enriched.movie;

    let year = movie.year.as_deref().unwrap_or("?");
    println!("{} ({})", movie.title, year);
    println!("{:-<70}", "");

    if let Some(imdb_id) = &movie.imdb_id {
        println!("IMDb: {imdb_id}");
    }
    if let Some(runtime) = movie.runtime {
        println!("Runtime: {runtime} min");
    }
    if !movie.genres.is_empty() {
        println!("Genres: {}", movie.genres.join(", "));
    }
    if let Some(rt) = &enriched.rotten_tomatoes_rating {
        println!("Rotten Tomatoes: {rt}");
    }
    if let Some(metascore) = enriched.metascore {
        println!("Metascore: {metascore}");
    }
    if let Some(rated) = &enriched.content_rating {
        println!("Rated: {rated}");
    }
    if let Some(awards) = &enriched.awards {
        println!("Awards: {awards}");
    }

    println!();
    match enriched.enrichment_source {
        EnrichmentSource::PrimaryAndSecondary => {
            println!("Enriched fields: {}", enriched.enriched_fields.join(", "));
        }
        EnrichmentSource::PrimaryOnly => {
            println!("Primary data only");
            if let Some(error) = &enriched.enrichment_error {
                println!("  Secondary lookup failed: {error}");
            }
        }
    }

    Ok(())
}
