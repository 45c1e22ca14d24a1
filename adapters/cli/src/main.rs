#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that inspects a map's navigation state.
//!
//! Loads an ASCII map, refreshes the heat field, plans a route from the
//! marked start cell, and prints both so map authors can eyeball the
//! navigation core's output without booting the full simulation.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use hive_defence_core::{CellCoord, CellRect, CellRectSize, Route, TerrainId, TileClass};
use hive_defence_system_pathfinder::find_route;
use hive_defence_world::{query, OccupancyGrid, Tile, World};

/// Map legend: `.` open, `#` wall, `~` limited, `o` occupied structure,
/// `G` goal structure cell, `S` start (at most one).
#[derive(Debug, Parser)]
#[command(name = "hive-defence", about = "Inspect routes and heat fields for a map")]
struct Args {
    /// Path to the ASCII map file.
    map: PathBuf,
}

/// Parsed map: the populated world plus the optional start marker.
#[derive(Debug)]
struct MapLayout {
    world: World,
    start: Option<CellCoord>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let text = fs::read_to_string(&args.map)
        .with_context(|| format!("failed to read map file {}", args.map.display()))?;
    let layout = parse_map(&text).context("failed to parse map")?;

    let mut world = layout.world;
    world.refresh_flow_field();

    println!("heat field (range {}):", world.flow_range());
    print_heat_field(&world);

    let start = layout
        .start
        .context("map contains no start marker 'S'")?;
    let route = find_route(query::grid(&world), query::goals(&world), start)
        .context("route planning failed")?;
    println!("\nroute from ({}, {}):", start.column(), start.row());
    print_route_overlay(&world, &text, &route);

    Ok(())
}

fn parse_map(text: &str) -> Result<MapLayout> {
    let lines: Vec<&str> = text.lines().filter(|line| !line.is_empty()).collect();
    if lines.is_empty() {
        bail!("map is empty");
    }

    let columns = lines[0].chars().count();
    let rows = lines.len();
    let mut tiles = Vec::with_capacity(columns * rows);
    let mut occupied = Vec::new();
    let mut goals = Vec::new();
    let mut start = None;

    for (row, line) in lines.iter().enumerate() {
        if line.chars().count() != columns {
            bail!("row {row} is {} cells wide, expected {columns}", line.chars().count());
        }
        for (column, glyph) in line.chars().enumerate() {
            let cell = CellCoord::new(column as u32, row as u32);
            let class = match glyph {
                '.' | 'o' | 'G' => TileClass::Open,
                '#' => TileClass::Wall,
                '~' => TileClass::Limited,
                'S' => {
                    if start.replace(cell).is_some() {
                        bail!("map contains more than one start marker 'S'");
                    }
                    TileClass::Open
                }
                other => bail!("unknown map glyph {other:?} at ({column}, {row})"),
            };
            if glyph == 'o' || glyph == 'G' {
                occupied.push(cell);
            }
            if glyph == 'G' {
                goals.push(cell);
            }
            tiles.push(Tile::new(class, TerrainId::new(0)));
        }
    }

    let grid = OccupancyGrid::from_tiles(columns as u32, rows as u32, tiles)
        .context("grid dimensions disagree with parsed tiles")?;
    let mut world = World::from_grid(grid);
    for cell in occupied {
        world
            .mark_structure_occupied(single_cell(cell))
            .context("structure placement out of bounds")?;
    }
    for cell in goals {
        world
            .register_goal(single_cell(cell))
            .context("goal registration out of bounds")?;
    }

    Ok(MapLayout { world, start })
}

fn single_cell(cell: CellCoord) -> CellRect {
    CellRect::from_origin_and_size(cell, CellRectSize::new(1, 1))
}

fn print_heat_field(world: &World) {
    let (columns, rows) = query::grid(world).dimensions();
    for row in 0..rows {
        let mut line = String::new();
        for column in 0..columns {
            let glyph = match world.flow_value_at(CellCoord::new(column, row)) {
                Some(value) if value < 16 => {
                    char::from_digit(u32::from(value), 16).unwrap_or('+')
                }
                Some(_) => '+',
                None => '\u{b7}',
            };
            line.push(glyph);
        }
        println!("{line}");
    }
}

fn print_route_overlay(world: &World, text: &str, route: &Route) {
    let (columns, rows) = query::grid(world).dimensions();
    let mut glyphs: Vec<Vec<char>> = text
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.chars().collect())
        .collect();

    for cell in route.iter() {
        if cell.column() < columns && cell.row() < rows {
            let row = cell.row() as usize;
            let column = cell.column() as usize;
            if glyphs[row][column] == '.' {
                glyphs[row][column] = '*';
            }
        }
    }

    for row in glyphs {
        println!("{}", row.into_iter().collect::<String>());
    }
}
