mod test_build_lifecycle;
mod test_surface_basic;
mod test_triangulation_basic;
