mod canvas;
mod details;
mod fps;
mod panels;
