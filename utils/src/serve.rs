/*
 * Copyright 2019 Michael Lodato <zvxryb@gmail.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

extern crate warp;

use warp::Filter;

use std::path::PathBuf;

fn main() {
    let mut project_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    project_dir.pop();

    let mut static_dir = project_dir.clone();
    static_dir.push("static");

    let mut index_path = static_dir.clone();
    index_path.push("index.html");

    let mut pkg_dir = project_dir.clone();
    pkg_dir.push("pkg");

    println!("{}", static_dir.display());
    println!("{}", pkg_dir.display());

    let index = warp::get2()
        .and(warp::path::end())
        .and(warp::fs::file(index_path));
    let pkg = warp::path("pkg")
        .and(warp::fs::dir(pkg_dir));
    // images, sound effects and music
    let assets = warp::fs::dir(static_dir);

    let routes = index.or(pkg).or(assets);

    warp::serve(routes).run(([127, 0, 0, 1], 8080));
}
