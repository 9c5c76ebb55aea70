pub mod counts_txt;
