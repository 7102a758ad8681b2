//! CLI utility for baking navigation tiles

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use navtile::{
    classify_off_mesh_point, NavTile, NavTileBuilder, OffMeshConnectionDesc, TileLocation,
};
use navtile_source::{PolyMesh, PolyMeshDetail, TileBuildSettings};

/// A CLI utility for baking polygon meshes into navigation tiles
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bake a tile from a JSON source description
    Bake {
        /// Source file holding settings, meshes and off-mesh connections (JSON)
        #[clap(long, value_parser)]
        input: PathBuf,

        /// Output tile file (JSON)
        #[clap(long, value_parser)]
        output: Option<PathBuf>,

        /// Skip building the bounding volume tree
        #[clap(long)]
        no_bv_tree: bool,

        /// Tile grid x coordinate
        #[clap(long, default_value = "0", allow_hyphen_values = true)]
        tile_x: i32,

        /// Tile grid y coordinate
        #[clap(long, default_value = "0", allow_hyphen_values = true)]
        tile_y: i32,

        /// Tile layer
        #[clap(long, default_value = "0")]
        layer: i32,

        /// User defined ID stored in the tile header
        #[clap(long, default_value = "0")]
        user_id: u32,
    },

    /// Classify a point against a tile footprint
    Classify {
        /// Footprint min corner (x,y,z)
        #[clap(long, value_parser = parse_vector, allow_hyphen_values = true)]
        min: Vec3,

        /// Footprint max corner (x,y,z)
        #[clap(long, value_parser = parse_vector, allow_hyphen_values = true)]
        max: Vec3,

        /// Point to classify (x,y,z)
        #[clap(long, value_parser = parse_vector, allow_hyphen_values = true)]
        point: Vec3,
    },
}

/// Everything needed to bake one tile
#[derive(Debug, Deserialize)]
struct TileSource {
    /// Falls back to the defaults on the mesh's own grid when absent
    #[serde(default)]
    settings: Option<TileBuildSettings>,
    poly_mesh: PolyMesh,
    #[serde(default)]
    detail_mesh: Option<PolyMeshDetail>,
    #[serde(default)]
    connections: Vec<OffMeshConnectionDesc>,
}

/// Parse a comma-separated vector
fn parse_vector(s: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').collect();

    if parts.len() != 3 {
        return Err(format!(
            "Vector must have 3 components, got {}",
            parts.len()
        ));
    }

    let x = parts[0].trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = parts[1].trim().parse::<f32>().map_err(|e| e.to_string())?;
    let z = parts[2].trim().parse::<f32>().map_err(|e| e.to_string())?;

    Ok(Vec3::new(x, y, z))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Bake {
            input,
            output,
            no_bv_tree,
            tile_x,
            tile_y,
            layer,
            user_id,
        } => bake_tile(
            &input,
            output.as_deref(),
            no_bv_tree,
            TileLocation::new(tile_x, tile_y, layer),
            user_id,
        ),
        Commands::Classify { min, max, point } => {
            classify_point(min, max, point);
            Ok(())
        }
    }
}

impl TileSource {
    fn settings(&self) -> TileBuildSettings {
        self.settings.clone().unwrap_or_else(|| TileBuildSettings {
            max_verts_per_poly: self.poly_mesh.nvp,
            cell_size: self.poly_mesh.cs,
            cell_height: self.poly_mesh.ch,
            ..Default::default()
        })
    }
}

fn load_source(path: &Path) -> Result<TileSource> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open source file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse source file: {}", path.display()))
}

/// Bake a tile and print its summary
fn bake_tile(
    input: &Path,
    output: Option<&Path>,
    no_bv_tree: bool,
    location: TileLocation,
    user_id: u32,
) -> Result<()> {
    println!("Loading tile source from {}...", input.display());

    let source = load_source(input)?;
    let mut settings = source.settings();
    if no_bv_tree {
        settings.build_bv_tree = false;
    }

    println!(
        "Source loaded: {} vertices, {} polygons, {} off-mesh connections",
        source.poly_mesh.nverts,
        source.poly_mesh.npolys,
        source.connections.len()
    );
    if source.detail_mesh.is_none() {
        log::info!("No detail mesh given, polygons will be fan-triangulated");
    }

    let tile = NavTileBuilder::new(settings)
        .with_location(location)
        .with_user_id(user_id)
        .build(
            &source.poly_mesh,
            source.detail_mesh.as_ref(),
            &source.connections,
        )
        .context("Failed to bake tile")?;

    print_summary(&tile);

    if let Some(output) = output {
        println!("Saving tile to {}...", output.display());
        let file = File::create(output)
            .with_context(|| format!("Failed to create output file: {}", output.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &tile)
            .with_context(|| format!("Failed to write tile: {}", output.display()))?;
    }

    Ok(())
}

fn print_summary(tile: &NavTile) {
    let header = tile.header();

    println!("Tile ({}, {}, {}):", header.x, header.y, header.layer);
    println!("  bounds: min={:?}, max={:?}", header.bmin, header.bmax);
    println!(
        "  polygons: {} ({} ground, {} off-mesh)",
        header.poly_count, header.off_mesh_base, header.off_mesh_con_count
    );
    println!("  vertices: {}", header.vert_count);
    println!("  max links: {}", header.max_link_count);
    println!(
        "  detail: {} meshes, {} vertices, {} triangles",
        header.detail_mesh_count, header.detail_vert_count, header.detail_tri_count
    );
    println!("  bv nodes: {}", header.bv_node_count);

    for con in tile.off_mesh_connections() {
        println!(
            "  off-mesh poly {}: {:?} -> {:?}, end {:?}",
            con.poly, con.start, con.end, con.side
        );
    }
}

fn classify_point(min: Vec3, max: Vec3, point: Vec3) {
    let side = classify_off_mesh_point(point, min, max);
    match side.sector() {
        Some(sector) => println!("{:?} (sector {})", side, sector),
        None => println!("{:?}", side),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vector() {
        assert_eq!(parse_vector("1,2.5,-3").unwrap(), Vec3::new(1.0, 2.5, -3.0));
        assert_eq!(parse_vector(" 0, 0 ,1").unwrap(), Vec3::new(0.0, 0.0, 1.0));
        assert!(parse_vector("1,2").is_err());
        assert!(parse_vector("1,x,3").is_err());
    }

    #[test]
    fn test_source_defaults() {
        let mut mesh = PolyMesh::new(6, Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0), 0.25, 0.1);
        let a = mesh.add_vertex([0, 0, 0]);
        let b = mesh.add_vertex([0, 0, 3]);
        let c = mesh.add_vertex([3, 0, 0]);
        mesh.add_polygon(&[a, b, c], &[], 1, 1);

        let json = serde_json::json!({ "poly_mesh": mesh });
        let source: TileSource = serde_json::from_value(json).unwrap();

        assert!(source.settings.is_none());
        assert!(source.detail_mesh.is_none());
        assert!(source.connections.is_empty());

        // Missing settings take the mesh's grid scale
        let settings = source.settings();
        assert_eq!(settings.cell_size, 0.25);
        assert_eq!(settings.cell_height, 0.1);
        assert_eq!(settings.max_climb, TileBuildSettings::default().max_climb);

        let tile = NavTileBuilder::new(settings)
            .build(&source.poly_mesh, None, &source.connections)
            .unwrap();
        assert_eq!(tile.header().poly_count, 1);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "navtile-cli",
            "classify",
            "--min",
            "0,0,0",
            "--max",
            "10,5,10",
            "--point",
            "-1,0,5",
        ]);
        match args.command {
            Commands::Classify { point, .. } => assert_eq!(point, Vec3::new(-1.0, 0.0, 5.0)),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
