mod test_mesh_basic;
mod test_tube_basic;
